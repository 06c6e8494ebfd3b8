//! In-process engine that records declarations instead of applying them.
//!
//! Used for dry runs and tests. Outputs have the same keys and shapes a real
//! provider would publish, with generated identifiers.
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use petgraph::{
    algo::{has_path_connecting, toposort},
    graph::{DiGraph, NodeIndex},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::engine::{
    COMPONENT_TYPE, Engine, EngineError, Outputs, Resource, ResourceArgs, ResourceKind,
    ResourceRef, ResourceRequest,
};

/// Initial state reported for freshly submitted batch jobs.
pub const JOB_STATE_QUEUED: &str = "JOB_STATE_QUEUED";

/// One recorded declaration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlannedResource {
    pub reference: ResourceRef,
    pub id: String,
    pub parent: Option<String>,
    pub depends_on: Vec<String>,
    pub retain_on_delete: bool,
    pub args: ResourceArgs,
    pub outputs: Outputs,
}

#[derive(Default)]
struct PlanState {
    resources: Vec<PlannedResource>,
    index: HashMap<String, usize>,
}

/// Recording [`Engine`].
///
/// Declarations are validated the way a real engine validates them (unique
/// names, known parents and dependencies) and kept in declaration order.
/// Failures can be injected per resource kind or per name.
#[derive(Default)]
pub struct PlanEngine {
    state: Mutex<PlanState>,
    rejected_kinds: HashMap<ResourceKind, String>,
    rejected_names: HashMap<String, String>,
}

impl PlanEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every declaration of `kind` with `reason`.
    pub fn reject_kind(mut self, kind: ResourceKind, reason: impl Into<String>) -> Self {
        self.rejected_kinds.insert(kind, reason.into());
        self
    }

    /// Fail the declaration named `name` with `reason`.
    pub fn reject_name(mut self, name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.rejected_names.insert(name.into(), reason.into());
        self
    }

    /// Number of accepted declarations.
    pub fn len(&self) -> usize {
        self.lock().resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of everything declared so far.
    pub fn plan(&self) -> ResourcePlan {
        ResourcePlan {
            resources: self.lock().resources.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PlanState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn rejection(&self, request: &ResourceRequest) -> Option<&String> {
        self.rejected_names
            .get(&request.name)
            .or_else(|| self.rejected_kinds.get(&request.kind()))
    }
}

#[async_trait]
impl Engine for PlanEngine {
    #[instrument(level = "trace", skip(self, request), fields(name = %request.name, kind = %request.kind()))]
    async fn register(&self, request: ResourceRequest) -> Result<Resource, EngineError> {
        let mut state = self.lock();

        if state.index.contains_key(&request.name) {
            return Err(EngineError::Duplicate(request.name));
        }
        if let Some(parent) = &request.options.parent
            && !state.index.contains_key(&parent.name)
        {
            return Err(EngineError::UnknownParent {
                resource: request.name.clone(),
                parent: parent.name.clone(),
            });
        }
        if let Some(dep) = request
            .options
            .depends_on
            .iter()
            .find(|dep| !state.index.contains_key(&dep.name))
        {
            return Err(EngineError::UnknownDependency {
                resource: request.name.clone(),
                dependency: dep.name.clone(),
            });
        }
        if let Some(reason) = self.rejection(&request) {
            debug!(%reason, "declaration rejected");
            return Err(EngineError::Rejected {
                resource: request.name.clone(),
                reason: reason.clone(),
            });
        }

        let id = Uuid::new_v4().simple().to_string();
        let outputs = synthesize_outputs(&request.args, &request.name, &id)?;
        let reference = ResourceRef {
            name: request.name.clone(),
            kind: request.kind(),
        };

        let planned = PlannedResource {
            reference: reference.clone(),
            id: id.clone(),
            parent: request.options.parent.as_ref().map(|p| p.name.clone()),
            depends_on: request
                .options
                .depends_on
                .iter()
                .map(|d| d.name.clone())
                .collect(),
            retain_on_delete: request.options.retain_on_delete,
            args: request.args,
            outputs: outputs.clone(),
        };
        let pos = state.resources.len();
        state.index.insert(request.name, pos);
        state.resources.push(planned);
        trace!(position = pos, "declaration recorded");

        Ok(Resource {
            reference,
            id,
            outputs,
        })
    }
}

/// Arguments are echoed back as outputs, then kind specific outputs are added.
fn synthesize_outputs(args: &ResourceArgs, name: &str, id: &str) -> Result<Outputs, EngineError> {
    let mut outputs = Outputs::default();
    if let Value::Object(map) = serde_json::to_value(args)? {
        for (key, value) in map.into_iter().filter(|(k, _)| k != "kind") {
            outputs.insert(key, value);
        }
    }

    match args {
        ResourceArgs::Component(_) => {
            outputs.insert("urn", format!("urn:{COMPONENT_TYPE}::{name}"));
        }
        ResourceArgs::ServiceAccount(a) => {
            let email = format!("{}@{}.iam.gserviceaccount.com", a.account_id, a.project);
            outputs.insert(
                "name",
                format!("projects/{}/serviceAccounts/{email}", a.project),
            );
            outputs.insert("email", email);
            outputs.insert("unique_id", id);
        }
        ResourceArgs::ProjectIamMember(a) => {
            outputs.insert("binding", format!("{}/{}/{}", a.project, a.role, a.member));
        }
        ResourceArgs::RepositoryIamMember(a) => {
            outputs.insert(
                "binding",
                format!(
                    "projects/{}/locations/{}/repositories/{}/{}/{}",
                    a.project, a.location, a.repository, a.role, a.member
                ),
            );
        }
        ResourceArgs::Bucket(a) => {
            outputs.insert("url", format!("gs://{}", a.name));
            outputs.insert(
                "self_link",
                format!("https://www.googleapis.com/storage/v1/b/{}", a.name),
            );
        }
        ResourceArgs::BucketObject(a) => {
            outputs.insert(
                "self_link",
                format!(
                    "https://www.googleapis.com/storage/v1/b/{}/o/{}",
                    a.bucket, a.name
                ),
            );
        }
        ResourceArgs::ModelDeployment(a) => {
            outputs.insert(
                "model_name",
                format!("projects/{}/locations/{}/models/{id}", a.project_id, a.region),
            );
            outputs.insert("deployed_model_id", id);
        }
        ResourceArgs::BatchPredictionJob(a) => {
            outputs.insert(
                "name",
                format!(
                    "projects/{}/locations/{}/batchPredictionJobs/{id}",
                    a.project, a.location
                ),
            );
            outputs.insert("state", JOB_STATE_QUEUED);
        }
    }
    Ok(outputs)
}

/// Immutable view of recorded declarations.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ResourcePlan {
    resources: Vec<PlannedResource>,
}

impl ResourcePlan {
    /// Declarations in the order they were made.
    pub fn resources(&self) -> &[PlannedResource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PlannedResource> {
        self.resources.iter().find(|r| r.reference.name == name)
    }

    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &PlannedResource> {
        self.resources
            .iter()
            .filter(move |r| r.reference.kind == kind)
    }

    /// Direct predecessors of `name`: its parent followed by its explicit dependencies.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        let Some(r) = self.get(name) else {
            return Vec::new();
        };
        r.parent
            .iter()
            .chain(r.depends_on.iter())
            .map(String::as_str)
            .collect()
    }

    /// True when `name` is ordered after `on`, directly or through other resources.
    pub fn waits_for(&self, name: &str, on: &str) -> bool {
        let (graph, nodes) = self.graph();
        match (nodes.get(on), nodes.get(name)) {
            (Some(&from), Some(&to)) if from != to => {
                has_path_connecting(&graph, from, to, None)
            }
            _ => false,
        }
    }

    /// An order in which every resource comes after its parent and dependencies.
    ///
    /// `register` only accepts references to earlier declarations, so the graph
    /// is acyclic and declaration order is itself a valid order.
    pub fn execution_order(&self) -> Vec<&str> {
        let (graph, _) = self.graph();
        match toposort(&graph, None) {
            Ok(order) => order.into_iter().map(|idx| graph[idx]).collect(),
            Err(_) => self.resources.iter().map(|r| r.reference.name.as_str()).collect(),
        }
    }

    /// Edges point from a predecessor to the resource waiting for it.
    fn graph(&self) -> (DiGraph<&str, ()>, HashMap<&str, NodeIndex>) {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        for r in &self.resources {
            let idx = graph.add_node(r.reference.name.as_str());
            nodes.insert(r.reference.name.as_str(), idx);
        }
        for r in &self.resources {
            let to = nodes[r.reference.name.as_str()];
            for dep in r.parent.iter().chain(r.depends_on.iter()) {
                if let Some(&from) = nodes.get(dep.as_str()) {
                    graph.add_edge(from, to, ());
                }
            }
        }
        (graph, nodes)
    }
}

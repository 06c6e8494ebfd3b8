use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use serde_json::Value;

use crate::engine::{EngineError, ResourceArgs};

/// Kind of a declared resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Logical owner of every other resource of one deployment.
    Component,
    ServiceAccount,
    ProjectIamMember,
    RepositoryIamMember,
    Bucket,
    BucketObject,
    ModelDeployment,
    BatchPredictionJob,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Component => "component",
            ResourceKind::ServiceAccount => "service-account",
            ResourceKind::ProjectIamMember => "project-iam-member",
            ResourceKind::RepositoryIamMember => "repository-iam-member",
            ResourceKind::Bucket => "bucket",
            ResourceKind::BucketObject => "bucket-object",
            ResourceKind::ModelDeployment => "model-deployment",
            ResourceKind::BatchPredictionJob => "batch-prediction-job",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a declared resource, used to express ownership and ordering.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceRef {
    pub name: String,
    pub kind: ResourceKind,
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Ownership and lifecycle options of a declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceOptions {
    /// Owning component. Every resource except the component itself has one.
    pub parent: Option<ResourceRef>,
    /// Resources that must be created before this one.
    pub depends_on: Vec<ResourceRef>,
    /// Leave the remote resource in place when it is deleted or replaced.
    pub retain_on_delete: bool,
}

impl ResourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parent(mut self, parent: &ResourceRef) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Append dependencies, skipping ones already listed.
    pub fn depends_on<'a, I>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = &'a ResourceRef>,
    {
        for dep in deps {
            if !self.depends_on.contains(dep) {
                self.depends_on.push(dep.clone());
            }
        }
        self
    }

    pub fn retain_on_delete(mut self, retain: bool) -> Self {
        self.retain_on_delete = retain;
        self
    }
}

/// One "declare this resource" call.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceRequest {
    /// Logical name, unique per engine.
    pub name: String,
    pub args: ResourceArgs,
    pub options: ResourceOptions,
}

impl ResourceRequest {
    pub fn new(name: impl Into<String>, args: ResourceArgs) -> Self {
        Self {
            name: name.into(),
            args,
            options: ResourceOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResourceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.args.kind()
    }
}

/// Resolved outputs of a declared resource, keyed by output name.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Outputs(pub BTreeMap<String, Value>);

impl Outputs {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }
}

/// A declared resource as returned by the engine.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Resource {
    pub reference: ResourceRef,
    /// Provider side identifier.
    pub id: String,
    pub outputs: Outputs,
}

impl Resource {
    pub fn name(&self) -> &str {
        &self.reference.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.reference.kind
    }

    pub fn reference(&self) -> &ResourceRef {
        &self.reference
    }

    /// String output that the engine is expected to publish for this kind.
    pub fn output(&self, key: &str) -> Result<&str, EngineError> {
        self.outputs
            .get_str(key)
            .ok_or_else(|| EngineError::MissingOutput {
                resource: self.reference.name.clone(),
                key: key.to_string(),
            })
    }
}

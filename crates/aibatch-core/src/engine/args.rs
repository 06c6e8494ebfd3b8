//! Typed arguments of every resource kind the orchestrator declares.
//!
//! Field names follow the provider APIs loosely; engines serialize them as
//! they see fit (the plan engine echoes them back as outputs).
use std::path::PathBuf;

use aibatch_model::{ArtifactKind, Labels, MachineSpec};
use serde::Serialize;

use crate::engine::ResourceKind;

/// Arguments of one declaration, tagged by resource kind.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResourceArgs {
    Component(ComponentArgs),
    ServiceAccount(ServiceAccountArgs),
    ProjectIamMember(IamMemberArgs),
    RepositoryIamMember(RepositoryIamMemberArgs),
    Bucket(BucketArgs),
    BucketObject(BucketObjectArgs),
    ModelDeployment(ModelDeploymentArgs),
    BatchPredictionJob(BatchPredictionJobArgs),
}

impl ResourceArgs {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceArgs::Component(_) => ResourceKind::Component,
            ResourceArgs::ServiceAccount(_) => ResourceKind::ServiceAccount,
            ResourceArgs::ProjectIamMember(_) => ResourceKind::ProjectIamMember,
            ResourceArgs::RepositoryIamMember(_) => ResourceKind::RepositoryIamMember,
            ResourceArgs::Bucket(_) => ResourceKind::Bucket,
            ResourceArgs::BucketObject(_) => ResourceKind::BucketObject,
            ResourceArgs::ModelDeployment(_) => ResourceKind::ModelDeployment,
            ResourceArgs::BatchPredictionJob(_) => ResourceKind::BatchPredictionJob,
        }
    }
}

/// Component resource type token.
pub const COMPONENT_TYPE: &str = "aibatch:gcp:AIBatch";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentArgs {
    pub type_token: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceAccountArgs {
    pub project: String,
    pub account_id: String,
    pub display_name: String,
    pub description: String,
}

/// Project level role binding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IamMemberArgs {
    pub project: String,
    pub role: String,
    /// `serviceAccount:<email>`.
    pub member: String,
}

/// Role binding scoped to one artifact registry repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RepositoryIamMemberArgs {
    pub project: String,
    pub location: String,
    pub repository: String,
    pub role: String,
    pub member: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BucketArgs {
    pub name: String,
    pub project: String,
    pub location: String,
    pub force_destroy: bool,
    pub uniform_bucket_level_access: bool,
    pub versioning: bool,
    pub labels: Labels,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BucketObjectArgs {
    pub bucket: String,
    /// Object key inside the bucket.
    pub name: String,
    /// Local file the object content is read from.
    pub source: PathBuf,
    pub content_type: String,
    pub artifact_kind: ArtifactKind,
}

/// Upload of model artifacts into the model registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelDeploymentArgs {
    pub project_id: String,
    pub region: String,
    pub display_name: String,
    pub model_artifacts_bucket_uri: String,
    pub model_image_url: String,
    pub model_prediction_input_schema_uri: String,
    pub model_prediction_output_schema_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_prediction_behavior_schema_uri: Option<String>,
    pub service_account: String,
    pub predict_route: String,
    pub health_route: String,
    pub machine: MachineSpec,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchPredictionJobArgs {
    pub project: String,
    pub location: String,
    pub display_name: String,
    /// Deployed model resource name or catalog model name.
    pub model: String,
    pub instances_format: String,
    pub input_uris: Vec<String>,
    pub predictions_format: String,
    pub output_uri_prefix: String,
    pub machine: MachineSpec,
    /// `0` lets the platform pick.
    pub batch_size: u32,
    pub service_account: String,
    pub labels: Labels,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
}

use std::collections::BTreeMap;

use aibatch_model::ArtifactKind;
use serde::Serialize;
use serde_json::{Value, json};

use crate::upload::UploadedObject;

/// Identifiers and URIs published by a successful run.
///
/// Model deployment fields are `None` for catalog models.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeploymentResult {
    pub service_account_email: String,
    pub job_id: String,
    pub job_name: String,
    pub job_display_name: String,
    pub job_state: String,
    /// Model the job runs against: deployed model resource or catalog name.
    pub model: String,
    pub model_image_url: Option<String>,
    pub model_artifacts_bucket_uri: Option<String>,
    pub model_deployment_id: Option<String>,
    pub deployed_model_id: Option<String>,
    pub artifacts_bucket_name: String,
    pub uploaded_objects: Vec<UploadedObject>,
    pub input_schema_uri: Option<String>,
    pub output_schema_uri: Option<String>,
    pub behavior_schema_uri: Option<String>,
    pub input_data_uri: String,
    pub output_data_uri_prefix: String,
}

impl DeploymentResult {
    /// Keys of every uploaded object, model artifacts first.
    pub fn uploaded_keys(&self) -> Vec<&str> {
        self.uploaded_objects.iter().map(|o| o.key.as_str()).collect()
    }

    pub fn uploaded_of_kind(&self, kind: ArtifactKind) -> impl Iterator<Item = &UploadedObject> {
        self.uploaded_objects.iter().filter(move |o| o.kind == kind)
    }

    /// Flat export map with stable `vertex_ai_batch_*` keys.
    ///
    /// Optional values are exported as `null`.
    pub fn exports(&self) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            (
                "vertex_ai_batch_model_service_account_email",
                json!(self.service_account_email),
            ),
            ("vertex_ai_batch_job_id", json!(self.job_id)),
            ("vertex_ai_batch_job_name", json!(self.job_name)),
            ("vertex_ai_batch_job_display_name", json!(self.job_display_name)),
            ("vertex_ai_batch_job_state", json!(self.job_state)),
            ("vertex_ai_batch_model", json!(self.model)),
            ("vertex_ai_batch_model_image_url", json!(self.model_image_url)),
            (
                "vertex_ai_batch_model_artifacts_bucket_uri",
                json!(self.model_artifacts_bucket_uri),
            ),
            (
                "vertex_ai_batch_model_deployment_id",
                json!(self.model_deployment_id),
            ),
            ("vertex_ai_batch_deployed_model_id", json!(self.deployed_model_id)),
            (
                "vertex_ai_batch_artifacts_bucket_name",
                json!(self.artifacts_bucket_name),
            ),
            ("vertex_ai_batch_uploaded_model_files", json!(self.uploaded_keys())),
            (
                "vertex_ai_batch_model_prediction_input_schema_uri",
                json!(self.input_schema_uri),
            ),
            (
                "vertex_ai_batch_model_prediction_output_schema_uri",
                json!(self.output_schema_uri),
            ),
            (
                "vertex_ai_batch_model_prediction_behavior_schema_uri",
                json!(self.behavior_schema_uri),
            ),
            ("vertex_ai_batch_input_data_uri", json!(self.input_data_uri)),
            (
                "vertex_ai_batch_output_data_uri_prefix",
                json!(self.output_data_uri_prefix),
            ),
        ])
    }
}

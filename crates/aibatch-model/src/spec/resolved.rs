use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{
    domain::{Flag, Labels},
    spec::{MachineSpec, ModelSource, job::registry_repository},
};

/// Batch input data: where it is read locally and how the job consumes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSpec {
    /// Local directory uploaded to the bucket.
    pub local_dir: PathBuf,
    /// Bucket prefix the files land under.
    pub bucket_path: String,
    pub format: String,
    /// Glob appended to the bucket prefix in the job input URI.
    pub file_pattern: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSpec {
    /// Bucket prefix predictions are written under.
    pub path: String,
    pub format: String,
}

/// A validated [`crate::JobSpec`] with every default applied.
///
/// Provisioning steps only ever see this type, so they never have to care
/// which values were supplied and which were defaulted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedJobSpec {
    pub project: String,
    pub region: String,
    /// Logical deployment name, base of every generated resource name.
    pub component: String,
    pub model: ModelSource,
    /// Normalized bucket prefix of model artifacts (no trailing `/`).
    pub model_bucket_base_path: String,
    pub model_image_url: String,
    pub job_display_name: String,
    pub model_display_name: String,
    pub machine: MachineSpec,
    pub input: InputSpec,
    pub output: OutputSpec,
    pub batch_size: u32,
    pub network: Option<String>,
    pub subnet: Option<String>,
    pub labels: Labels,
    pub enable_private_registry_access: Flag,
    pub retain_job_on_delete: Flag,
}

impl ResolvedJobSpec {
    /// Local model directory, `None` for catalog models.
    pub fn model_dir(&self) -> Option<&Path> {
        self.model.local_dir()
    }

    /// Artifact registry repository hosting the serving image.
    pub fn registry_repository(&self) -> Option<&str> {
        registry_repository(&self.model_image_url)
    }
}

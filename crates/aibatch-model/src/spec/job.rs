use std::path::{Path, PathBuf};

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    defaults,
    domain::{Flag, Labels, normalize_key},
    error::{ModelError, ModelResult},
    spec::{InputSpec, MachineSpec, OutputSpec, ReplicaBounds, ResolvedJobSpec},
};

/// Caller supplied description of one batch inference deployment.
///
/// Every optional field may be left unset (or set to an empty string); the
/// gaps are filled by [`JobSpec::resolve`]. The spec is validated once and then
/// consumed, it is never mutated by the provisioning steps.
///
/// Fields cover:
/// - target location (`project`, `region`)
/// - model source: a local artifact directory *or* a catalog model name
/// - serving container and compute sizing
/// - input/output locations and formats of the batch job
/// - labels and lifecycle flags
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct JobSpec {
    /// Cloud project the resources are created in. Required.
    pub project: String,
    /// Region of the bucket, model and job (e.g. `us-central1`). Required.
    pub region: String,

    /// Local directory with model artifacts, including the schema files.
    ///
    /// Mutually exclusive with `model_name`.
    pub model_dir: Option<PathBuf>,
    /// Name of a pre-existing catalog model.
    ///
    /// When set nothing is uploaded from a model directory and no model
    /// deployment is declared; the job references this name directly.
    pub model_name: Option<String>,
    /// Input schema path relative to `model_dir`. Required with `model_dir`.
    pub input_schema_path: Option<String>,
    /// Output schema path relative to `model_dir`. Required with `model_dir`.
    pub output_schema_path: Option<String>,
    pub behavior_schema_path: Option<String>,
    /// Bucket prefix for model artifacts. Defaults to `model`.
    pub model_bucket_base_path: Option<String>,

    /// Serving container image.
    pub model_image_url: Option<String>,
    pub machine_type: Option<String>,
    /// Defaults to the component name.
    pub job_display_name: Option<String>,
    /// Defaults to the component name with a `-model` suffix.
    pub model_display_name: Option<String>,

    /// Local directory holding the batch input files. Defaults to `inputs`.
    pub input_data_path: Option<PathBuf>,
    pub input_format: Option<String>,
    /// Glob the job reads inside the uploaded input prefix.
    /// Defaults to `*.<input format>`.
    pub input_file_pattern: Option<String>,
    /// Bucket prefix predictions are written under. Defaults to `predictions/`.
    pub output_data_path: Option<String>,
    pub output_format: Option<String>,

    pub starting_replica_count: Option<u32>,
    pub max_replica_count: Option<u32>,
    /// Instances per batch; `0` lets the platform decide.
    pub batch_size: Option<u32>,
    pub accelerator_type: Option<String>,
    pub accelerator_count: Option<u32>,

    pub network: Option<String>,
    pub subnet: Option<String>,

    /// User labels, applied to the bucket and the job.
    #[serde(skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
    /// Grant the service account read access to the image repository.
    pub enable_private_registry_access: Flag,
    /// Keep submitted jobs when the deployment is destroyed or replaced.
    pub retain_job_on_delete: Flag,
}

/// Where the model served by the batch job comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ModelSource {
    /// Artifacts are uploaded from a local directory and deployed.
    Directory {
        path: PathBuf,
        input_schema_path: String,
        output_schema_path: String,
        behavior_schema_path: Option<String>,
    },
    /// A model that already exists in the managed catalog.
    Catalog { name: String },
}

impl ModelSource {
    /// Returns `true` for a model referenced by catalog name.
    pub fn is_catalog(&self) -> bool {
        matches!(self, ModelSource::Catalog { .. })
    }

    /// Local artifact directory, `None` for catalog models.
    pub fn local_dir(&self) -> Option<&Path> {
        match self {
            ModelSource::Directory { path, .. } => Some(path),
            ModelSource::Catalog { .. } => None,
        }
    }
}

impl JobSpec {
    /// Check required fields and cross-field invariants.
    ///
    /// Checks run in a fixed order and the first failure is returned, so a
    /// given spec always reports the same error.
    pub fn validate(&self) -> ModelResult<()> {
        self.model_source()?;

        let starting = self
            .starting_replica_count
            .unwrap_or(defaults::STARTING_REPLICA_COUNT);
        let max = self.max_replica_count.unwrap_or(defaults::MAX_REPLICA_COUNT);
        ReplicaBounds::new(starting, max)?;

        if self.enable_private_registry_access.is_enabled() {
            let image = self.image_url();
            if registry_repository(image).is_none() {
                return Err(ModelError::InvalidImageUrl(image.to_string()));
            }
        }
        Ok(())
    }

    /// Validate and fill every unset field with its default.
    ///
    /// `component` is the logical deployment name; display names default to it.
    pub fn resolve(self, component: &str) -> ModelResult<ResolvedJobSpec> {
        self.validate()?;
        let model = self.model_source()?;

        let model_bucket_base_path = normalize_key(
            non_empty(&self.model_bucket_base_path).unwrap_or(defaults::MODEL_BUCKET_BASE_PATH),
        );
        let model_image_url = self.image_url().to_string();
        let input_format = or_default(&self.input_format, defaults::INPUT_FORMAT);
        let file_pattern = non_empty(&self.input_file_pattern)
            .map(str::to_string)
            .unwrap_or_else(|| format!("*.{input_format}"));

        let input_dir = self
            .input_data_path
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(defaults::INPUT_DATA_PATH));

        let machine = MachineSpec {
            machine_type: or_default(&self.machine_type, defaults::MACHINE_TYPE),
            accelerator_type: or_default(&self.accelerator_type, defaults::ACCELERATOR_TYPE),
            accelerator_count: self
                .accelerator_count
                .unwrap_or(defaults::ACCELERATOR_COUNT),
            replicas: ReplicaBounds::new(
                self.starting_replica_count
                    .unwrap_or(defaults::STARTING_REPLICA_COUNT),
                self.max_replica_count.unwrap_or(defaults::MAX_REPLICA_COUNT),
            )?,
        };

        Ok(ResolvedJobSpec {
            component: component.to_string(),
            job_display_name: or_default(&self.job_display_name, component),
            model_display_name: non_empty(&self.model_display_name)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{component}{}", defaults::MODEL_DISPLAY_NAME_SUFFIX)),
            model,
            model_bucket_base_path,
            model_image_url,
            machine,
            input: InputSpec {
                local_dir: input_dir,
                bucket_path: defaults::INPUT_DATA_BUCKET_PATH.to_string(),
                format: input_format,
                file_pattern,
            },
            output: OutputSpec {
                path: or_default(&self.output_data_path, defaults::OUTPUT_DATA_PATH),
                format: or_default(&self.output_format, defaults::OUTPUT_FORMAT),
            },
            batch_size: self.batch_size.unwrap_or(defaults::BATCH_SIZE),
            network: non_empty(&self.network).map(str::to_string),
            subnet: non_empty(&self.subnet).map(str::to_string),
            labels: self.labels,
            enable_private_registry_access: self.enable_private_registry_access,
            retain_job_on_delete: self.retain_job_on_delete,
            project: self.project,
            region: self.region,
        })
    }

    fn model_source(&self) -> ModelResult<ModelSource> {
        if self.project.trim().is_empty() {
            return Err(ModelError::MissingProject);
        }
        if self.region.trim().is_empty() {
            return Err(ModelError::MissingRegion);
        }

        let dir = self
            .model_dir
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty());
        let name = non_empty(&self.model_name);

        match (dir, name) {
            (None, None) => Err(ModelError::MissingModelSource),
            (Some(_), Some(_)) => Err(ModelError::ConflictingModelSource),
            (None, Some(name)) => Ok(ModelSource::Catalog {
                name: name.to_string(),
            }),
            (Some(path), None) => {
                let input = non_empty(&self.input_schema_path).ok_or(ModelError::MissingInputSchema)?;
                let output =
                    non_empty(&self.output_schema_path).ok_or(ModelError::MissingOutputSchema)?;
                Ok(ModelSource::Directory {
                    path: path.clone(),
                    input_schema_path: input.to_string(),
                    output_schema_path: output.to_string(),
                    behavior_schema_path: non_empty(&self.behavior_schema_path).map(str::to_string),
                })
            }
        }
    }

    fn image_url(&self) -> &str {
        non_empty(&self.model_image_url).unwrap_or(defaults::MODEL_IMAGE_URL)
    }
}

/// Repository segment of an image reference (`<host>/<project>/<repository>/...`).
pub(crate) fn registry_repository(image: &str) -> Option<&str> {
    image.split('/').nth(2).filter(|s| !s.is_empty())
}

fn non_empty(opt: &Option<String>) -> Option<&str> {
    opt.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn or_default(opt: &Option<String>, default: &str) -> String {
    non_empty(opt).unwrap_or(default).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> JobSpec {
        JobSpec {
            project: "test-project".into(),
            region: "us-central1".into(),
            model_dir: Some("testdata/model".into()),
            input_schema_path: Some("input_schema.yaml".into()),
            output_schema_path: Some("output_schema.yaml".into()),
            ..Default::default()
        }
    }

    fn err(spec: JobSpec) -> String {
        spec.validate().unwrap_err().to_string()
    }

    #[test]
    fn missing_required_fields_have_literal_messages() {
        assert_eq!(err(JobSpec { project: "".into(), ..required() }), "project is required");
        assert_eq!(err(JobSpec { region: " ".into(), ..required() }), "region is required");
        assert_eq!(
            err(JobSpec { model_dir: None, ..required() }),
            "model directory or model name is required"
        );
        assert_eq!(
            err(JobSpec { input_schema_path: None, ..required() }),
            "model prediction input schema path is required"
        );
        assert_eq!(
            err(JobSpec { output_schema_path: Some("".into()), ..required() }),
            "model prediction output schema path is required"
        );
    }

    #[test]
    fn project_is_checked_before_region() {
        let spec = JobSpec {
            project: "".into(),
            region: "".into(),
            ..required()
        };
        assert_eq!(spec.validate().unwrap_err(), ModelError::MissingProject);
    }

    #[test]
    fn model_dir_and_name_are_exclusive() {
        let spec = JobSpec {
            model_name: Some("gemma".into()),
            ..required()
        };
        assert_eq!(spec.validate().unwrap_err(), ModelError::ConflictingModelSource);
    }

    #[test]
    fn empty_model_dir_counts_as_unset() {
        let spec = JobSpec {
            model_dir: Some(PathBuf::new()),
            model_name: Some("publishers/google/models/gemma".into()),
            ..required()
        };
        spec.validate().unwrap();
    }

    #[test]
    fn catalog_model_needs_no_schemas() {
        let spec = JobSpec {
            model_dir: None,
            model_name: Some("gemma".into()),
            input_schema_path: None,
            output_schema_path: None,
            ..required()
        };
        let resolved = spec.resolve("test-vertex-batch").unwrap();
        assert_eq!(
            resolved.model,
            ModelSource::Catalog {
                name: "gemma".into()
            }
        );
        assert!(resolved.model.local_dir().is_none());
    }

    #[test]
    fn inverted_replica_bounds_are_rejected() {
        let spec = JobSpec {
            starting_replica_count: Some(5),
            ..required()
        };
        assert_eq!(spec.validate().unwrap_err(), ModelError::InvalidReplicaBounds);
    }

    #[test]
    fn registry_access_requires_repository_segment() {
        let spec = JobSpec {
            model_image_url: Some("my-image:latest".into()),
            enable_private_registry_access: Flag::enabled(),
            ..required()
        };
        assert_eq!(err(spec), "invalid model image url: my-image:latest");

        let spec = JobSpec {
            model_image_url: Some("us-docker.pkg.dev/my-project/my-repo/server:1".into()),
            enable_private_registry_access: Flag::enabled(),
            ..required()
        };
        spec.validate().unwrap();
    }

    #[test]
    fn malformed_image_is_fine_without_registry_access() {
        let spec = JobSpec {
            model_image_url: Some("my-image:latest".into()),
            ..required()
        };
        spec.validate().unwrap();
    }

    #[test]
    fn repository_is_third_segment() {
        assert_eq!(
            registry_repository("us-docker.pkg.dev/vertex-ai/prediction/tf2-cpu.2-15:latest"),
            Some("prediction")
        );
        assert_eq!(registry_repository("host/project"), None);
        assert_eq!(registry_repository("host/project//image"), None);
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let spec: JobSpec = serde_json::from_str(
            r#"{
                "project": "p",
                "region": "r",
                "modelName": "gemma",
                "maxReplicaCount": 5,
                "labels": {"team": "ml"},
                "retainJobOnDelete": true
            }"#,
        )
        .unwrap();
        assert_eq!(spec.model_name.as_deref(), Some("gemma"));
        assert_eq!(spec.max_replica_count, Some(5));
        assert_eq!(spec.labels.get("team"), Some("ml"));
        assert!(spec.retain_job_on_delete.is_enabled());
        assert!(spec.enable_private_registry_access.is_disabled());
    }
}

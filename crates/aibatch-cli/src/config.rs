//! Process configuration read from environment variables.
use std::{path::PathBuf, str::FromStr};

use aibatch_model::{Flag, JobSpec, Labels};
use aibatch_observe::{LoggerConfig, LoggerFormat, LoggerLevel, LoggerTimeZone};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_COMPONENT_NAME: &str = "aibatch";
pub const DEFAULT_MODEL_BUCKET_BASE_PATH: &str = "model/";
pub const DEFAULT_MACHINE_TYPE: &str = "n1-standard-2";
pub const DEFAULT_INPUT_DATA_URI: &str = "inputs/";
pub const DEFAULT_OUTPUT_DATA_URI_PREFIX: &str = "predictions/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Everything the `aibatch` binary needs for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub component_name: String,
    pub job: JobSpec,
    pub logger: LoggerConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let job = JobSpec {
            project: env.required("GCP_PROJECT")?,
            region: env.required("GCP_REGION")?,
            model_dir: env.get("MODEL_DIR").map(PathBuf::from),
            model_name: env.get("MODEL_NAME"),
            input_schema_path: env.get("MODEL_PREDICTION_INPUT_SCHEMA_PATH"),
            output_schema_path: env.get("MODEL_PREDICTION_OUTPUT_SCHEMA_PATH"),
            behavior_schema_path: env.get("MODEL_PREDICTION_BEHAVIOR_SCHEMA_PATH"),
            model_bucket_base_path: Some(
                env.get_or("MODEL_BUCKET_BASE_PATH", DEFAULT_MODEL_BUCKET_BASE_PATH),
            ),
            model_image_url: env.get("MODEL_IMAGE_URL"),
            machine_type: Some(env.get_or("MACHINE_TYPE", DEFAULT_MACHINE_TYPE)),
            job_display_name: env.get("JOB_DISPLAY_NAME"),
            model_display_name: env.get("MODEL_DISPLAY_NAME"),
            input_data_path: Some(PathBuf::from(
                env.get_or("INPUT_DATA_URI", DEFAULT_INPUT_DATA_URI),
            )),
            input_format: env.get("INPUT_FORMAT"),
            input_file_pattern: env.get("INPUT_FILE_NAME"),
            output_data_path: Some(env.get_or("OUTPUT_DATA_URI_PREFIX", DEFAULT_OUTPUT_DATA_URI_PREFIX)),
            output_format: env.get("OUTPUT_FORMAT"),
            starting_replica_count: env.parsed("STARTING_REPLICA_COUNT")?,
            max_replica_count: env.parsed("MAX_REPLICA_COUNT")?,
            batch_size: env.parsed("BATCH_SIZE")?,
            accelerator_type: env.get("ACCELERATOR_TYPE"),
            accelerator_count: env.parsed("ACCELERATOR_COUNT")?,
            network: env.get("NETWORK"),
            subnet: env.get("SUBNET"),
            labels: env.parsed::<Labels>("LABELS")?.unwrap_or_default(),
            enable_private_registry_access: env
                .parsed::<Flag>("ENABLE_PRIVATE_REGISTRY_ACCESS")?
                .unwrap_or_default(),
            retain_job_on_delete: env.parsed::<Flag>("RETAIN_JOB_ON_DELETE")?.unwrap_or_default(),
        };

        let logger = LoggerConfig {
            level: env.parsed::<LoggerLevel>("LOG_LEVEL")?.unwrap_or_default(),
            format: env.parsed::<LoggerFormat>("LOG_FORMAT")?.unwrap_or_default(),
            tz: env.parsed::<LoggerTimeZone>("LOG_TIMEZONE")?.unwrap_or_default(),
            ..Default::default()
        };

        Ok(Self {
            component_name: env.get_or("COMPONENT_NAME", DEFAULT_COMPONENT_NAME),
            job,
            logger,
        })
    }

    /// Emit the loaded settings as one event. Call after the logger is installed.
    pub fn log(&self) {
        let job = &self.job;
        info!(
            component = %self.component_name,
            project = %job.project,
            region = %job.region,
            model_dir = ?job.model_dir,
            model_name = ?job.model_name,
            machine_type = ?job.machine_type,
            input_data = ?job.input_data_path,
            output_data = ?job.output_data_path,
            labels = job.labels.len(),
            private_registry = job.enable_private_registry_access.is_enabled(),
            retain_job = job.retain_job_on_delete.is_enabled(),
            log_level = %self.logger.level.as_str(),
            log_format = %self.logger.format,
            "configuration loaded"
        );
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parsed<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| ConfigError::Invalid { key, value })
            })
            .transpose()
    }
}

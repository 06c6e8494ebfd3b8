//! Well-known keys and default values of the model layer.
//!
//! Defaults live in one place so the resolver, the env loader and the tests
//! agree on the same literals.

/// Label key attached to the artifacts bucket.
pub const LABEL_PURPOSE: &str = "purpose";

/// Value of [`LABEL_PURPOSE`] for the artifacts bucket.
pub const LABEL_PURPOSE_MODEL_STORAGE: &str = "model-storage";

/// Default values applied by [`crate::JobSpec::resolve`].
pub mod defaults {
    /// Base path of model artifacts inside the bucket.
    pub const MODEL_BUCKET_BASE_PATH: &str = "model";
    /// Local directory holding the batch input files.
    pub const INPUT_DATA_PATH: &str = "inputs";
    /// Bucket prefix the input files are uploaded under.
    pub const INPUT_DATA_BUCKET_PATH: &str = "inputs";
    pub const INPUT_FORMAT: &str = "jsonl";
    pub const OUTPUT_DATA_PATH: &str = "predictions/";
    pub const OUTPUT_FORMAT: &str = "jsonl";
    pub const STARTING_REPLICA_COUNT: u32 = 1;
    pub const MAX_REPLICA_COUNT: u32 = 3;
    /// Zero lets the platform pick the batch size.
    pub const BATCH_SIZE: u32 = 0;
    pub const ACCELERATOR_TYPE: &str = "ACCELERATOR_TYPE_UNSPECIFIED";
    pub const ACCELERATOR_COUNT: u32 = 1;
    /// TensorFlow 2.15 CPU prediction container.
    pub const MODEL_IMAGE_URL: &str = "us-docker.pkg.dev/vertex-ai/prediction/tf2-cpu.2-15:latest";
    pub const MACHINE_TYPE: &str = "n1-highmem-4";
    /// Appended to the component name when no model display name is given.
    pub const MODEL_DISPLAY_NAME_SUFFIX: &str = "-model";
}

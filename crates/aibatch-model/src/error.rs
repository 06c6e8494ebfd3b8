use thiserror::Error;

/// Configuration errors detected before any remote resource is requested.
///
/// The display strings are part of the public contract: callers and operators
/// match on them, so they must stay literal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("project is required")]
    MissingProject,

    #[error("region is required")]
    MissingRegion,

    #[error("model directory or model name is required")]
    MissingModelSource,

    #[error("model directory and model name are mutually exclusive")]
    ConflictingModelSource,

    #[error("model prediction input schema path is required")]
    MissingInputSchema,

    #[error("model prediction output schema path is required")]
    MissingOutputSchema,

    #[error("invalid model image url: {0}")]
    InvalidImageUrl(String),

    #[error("max replica count must not be lower than starting replica count")]
    InvalidReplicaBounds,

    #[error("invalid flag value: {0}")]
    InvalidFlag(String),

    #[error("invalid label: {0}")]
    InvalidLabel(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

use thiserror::Error;

/// Failures reported by an [`crate::engine::Engine`] for a single declaration.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("duplicate resource: {0}")]
    Duplicate(String),

    #[error("resource {resource} depends on undeclared resource {dependency}")]
    UnknownDependency { resource: String, dependency: String },

    #[error("resource {resource} names undeclared parent {parent}")]
    UnknownParent { resource: String, parent: String },

    #[error("declaration of {resource} rejected: {reason}")]
    Rejected { resource: String, reason: String },

    #[error("resource {resource} has no output {key}")]
    MissingOutput { resource: String, key: String },

    #[error("failed to encode resource arguments: {0}")]
    Encode(#[from] serde_json::Error),
}

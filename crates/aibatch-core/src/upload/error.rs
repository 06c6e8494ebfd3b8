use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineError;

/// Failures while turning a local directory into bucket objects.
///
/// Every variant carries the local path that caused it.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("error walking path {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("error calculating relative path of {} from {}", path.display(), base.display())]
    RelativePath { path: PathBuf, base: PathBuf },

    #[error("error creating bucket object for {}: {source}", path.display())]
    Remote {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
}

impl UploadError {
    /// Local path the failure is attributed to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            UploadError::Walk { path, .. }
            | UploadError::RelativePath { path, .. }
            | UploadError::Remote { path, .. } => path,
        }
    }
}

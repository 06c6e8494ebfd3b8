use std::path::{Component, Path, PathBuf};

use aibatch_model::{ArtifactKind, join_key};
use serde::Serialize;
use tracing::trace;
use walkdir::WalkDir;

use crate::upload::{UploadError, content_type_for};

/// One local file and the object key it is uploaded to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub local_path: PathBuf,
    /// Forward-slash key, prefixed with the base path.
    pub key: String,
    pub content_type: String,
    pub kind: ArtifactKind,
}

/// Ordered set of files to upload from one directory.
///
/// Entries are sorted by path (walk order with sorted siblings), so two walks
/// of the same tree produce identical manifests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UploadManifest {
    entries: Vec<ManifestEntry>,
}

impl UploadManifest {
    /// Walk `local_dir` and map every regular, non-hidden file to a key under `base`.
    ///
    /// An unset or empty `local_dir` yields an empty manifest. Directories are
    /// descended but never produce entries; files whose name starts with `.` are
    /// skipped.
    pub fn build(
        local_dir: Option<&Path>,
        base: &str,
        kind: ArtifactKind,
    ) -> Result<Self, UploadError> {
        let Some(dir) = local_dir.filter(|d| !d.as_os_str().is_empty()) else {
            return Ok(Self::default());
        };

        let mut entries = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| UploadError::Walk {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
                source: e,
            })?;

            if entry.file_type().is_dir() || is_hidden(entry.file_name()) {
                continue;
            }

            let path = entry.path();
            let rel = path
                .strip_prefix(dir)
                .map_err(|_| UploadError::RelativePath {
                    path: path.to_path_buf(),
                    base: dir.to_path_buf(),
                })?;
            let key = join_key(base, &to_key(rel));
            trace!(path = %path.display(), %key, "manifest entry");

            entries.push(ManifestEntry {
                local_path: path.to_path_buf(),
                content_type: content_type_for(path),
                key,
                kind,
            });
        }
        Ok(Self { entries })
    }

    /// Entries in walk order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Object keys in walk order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Relative path joined with `/`, whatever the host separator is.
fn to_key(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

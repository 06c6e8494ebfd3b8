//! Directory uploader: local files to bucket objects.
//!
//! A directory is first turned into an [`UploadManifest`] (pure, local I/O only),
//! then every entry is declared as a bucket object. Declarations are issued
//! concurrently and the first failure aborts the whole upload.
mod content_type;
pub use content_type::{OCTET_STREAM, content_type_for};

mod error;
pub use error::UploadError;

mod manifest;
pub use manifest::{ManifestEntry, UploadManifest};

use std::path::Path;

use aibatch_model::ArtifactKind;
use futures::future::try_join_all;
use serde::Serialize;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::engine::{
    BucketObjectArgs, Engine, ResourceArgs, ResourceOptions, ResourceRef, ResourceRequest,
};

/// A declared bucket object, tagged with what it is used for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UploadedObject {
    pub key: String,
    pub kind: ArtifactKind,
    pub content_type: String,
    #[serde(skip)]
    pub resource: ResourceRef,
}

/// Uploads directories into one bucket on behalf of one component.
pub struct Uploader<'a> {
    engine: &'a dyn Engine,
    bucket_name: &'a str,
    bucket: &'a ResourceRef,
    parent: &'a ResourceRef,
}

impl<'a> Uploader<'a> {
    pub fn new(
        engine: &'a dyn Engine,
        bucket_name: &'a str,
        bucket: &'a ResourceRef,
        parent: &'a ResourceRef,
    ) -> Self {
        Self {
            engine,
            bucket_name,
            bucket,
            parent,
        }
    }

    /// Upload every regular, non-hidden file under `local_dir` to `base/<relative path>`.
    ///
    /// Returns one [`UploadedObject`] per file, in manifest order. An unset
    /// directory uploads nothing.
    #[instrument(level = "debug", skip(self, local_dir, kind), fields(bucket = %self.bucket_name, kind = %kind))]
    pub async fn upload(
        &self,
        local_dir: Option<&Path>,
        base: &str,
        kind: ArtifactKind,
    ) -> Result<Vec<UploadedObject>, UploadError> {
        let manifest = UploadManifest::build(local_dir, base, kind)?;
        if manifest.is_empty() {
            debug!("nothing to upload");
            return Ok(Vec::new());
        }
        self.upload_manifest(&manifest).await
    }

    /// Declare one bucket object per manifest entry.
    pub async fn upload_manifest(
        &self,
        manifest: &UploadManifest,
    ) -> Result<Vec<UploadedObject>, UploadError> {
        let uploads = manifest.entries().iter().map(|entry| self.upload_entry(entry));
        let objects = try_join_all(uploads).await?;
        debug!(count = objects.len(), "objects declared");
        Ok(objects)
    }

    async fn upload_entry(&self, entry: &ManifestEntry) -> Result<UploadedObject, UploadError> {
        trace!(key = %entry.key, content_type = %entry.content_type, "declaring object");

        let request = ResourceRequest::new(
            object_resource_name(&entry.key),
            ResourceArgs::BucketObject(BucketObjectArgs {
                bucket: self.bucket_name.to_string(),
                name: entry.key.clone(),
                source: entry.local_path.clone(),
                content_type: entry.content_type.clone(),
                artifact_kind: entry.kind,
            }),
        )
        .with_options(
            ResourceOptions::new()
                .parent(self.parent)
                .depends_on([self.bucket]),
        );

        let resource = self
            .engine
            .register(request)
            .await
            .map_err(|source| UploadError::Remote {
                path: entry.local_path.clone(),
                source,
            })?;

        Ok(UploadedObject {
            key: entry.key.clone(),
            kind: entry.kind,
            content_type: entry.content_type.clone(),
            resource: resource.reference,
        })
    }
}

/// Logical name of the object resource.
///
/// `file-<flattened key>-<hash>`: the key with `/` and `.` as `-`, followed by
/// the first 8 hex digits of a name-based UUID of the full key. Flattening
/// alone maps `a/b.json` and `a-b/json` to the same text; the hash keeps
/// names distinct per key.
pub fn object_resource_name(key: &str) -> String {
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes()).simple().to_string();
    format!("file-{}-{}", key.replace(['/', '.'], "-"), &digest[..8])
}

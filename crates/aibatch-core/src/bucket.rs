//! Artifacts bucket shared by model files, input data and predictions.
use aibatch_model::{
    LABEL_PURPOSE, LABEL_PURPOSE_MODEL_STORAGE, Labels, MAX_RESOURCE_NAME_LEN, Namer,
    ResolvedJobSpec, normalize_key,
};
use tracing::{debug, instrument};

use crate::{
    engine::{BucketArgs, Engine, Resource, ResourceArgs, ResourceOptions, ResourceRef, ResourceRequest},
    error::StepError,
};

/// The declared bucket.
#[derive(Clone, Debug)]
pub struct ArtifactsBucket {
    pub resource: Resource,
    pub name: String,
}

impl ArtifactsBucket {
    pub fn reference(&self) -> &ResourceRef {
        self.resource.reference()
    }

    /// `gs://<bucket>`.
    pub fn url(&self) -> String {
        format!("gs://{}", self.name)
    }

    /// `gs://<bucket>/<path>` with `path` normalized to key form.
    pub fn uri(&self, path: &str) -> String {
        let key = normalize_key(path);
        if key.is_empty() {
            self.url()
        } else {
            format!("gs://{}/{key}", self.name)
        }
    }
}

/// Labels of the bucket: the storage purpose label merged with user labels.
pub fn bucket_labels(user: &Labels) -> Labels {
    let mut base = Labels::new();
    base.insert(LABEL_PURPOSE, LABEL_PURPOSE_MODEL_STORAGE);
    base.merged(user)
}

#[instrument(level = "debug", skip_all)]
pub async fn create_artifacts_bucket(
    engine: &dyn Engine,
    spec: &ResolvedJobSpec,
    namer: &Namer,
    parent: &ResourceRef,
) -> Result<ArtifactsBucket, StepError> {
    let name = namer.resource_name("vertex-model", "bucket", MAX_RESOURCE_NAME_LEN);
    let request = ResourceRequest::new(
        name.clone(),
        ResourceArgs::Bucket(BucketArgs {
            name,
            project: spec.project.clone(),
            location: spec.region.clone(),
            // bucket content is owned by the pipeline
            force_destroy: true,
            uniform_bucket_level_access: true,
            versioning: true,
            labels: bucket_labels(&spec.labels),
        }),
    )
    .with_options(ResourceOptions::new().parent(parent));

    let resource = engine.register(request).await?;
    let name = resource.output("name")?.to_string();
    debug!(bucket = %name, "artifacts bucket declared");
    Ok(ArtifactsBucket { resource, name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Outputs, ResourceKind};

    fn bucket() -> ArtifactsBucket {
        ArtifactsBucket {
            resource: Resource {
                reference: ResourceRef {
                    name: "b".into(),
                    kind: ResourceKind::Bucket,
                },
                id: "b".into(),
                outputs: Outputs::default(),
            },
            name: "batch-vertex-model-bucket".into(),
        }
    }

    #[test]
    fn uris_are_normalized() {
        let b = bucket();
        assert_eq!(b.url(), "gs://batch-vertex-model-bucket");
        assert_eq!(b.uri("model/"), "gs://batch-vertex-model-bucket/model");
        assert_eq!(b.uri("/inputs"), "gs://batch-vertex-model-bucket/inputs");
        assert_eq!(b.uri(""), "gs://batch-vertex-model-bucket");
    }

    #[test]
    fn user_labels_override_purpose() {
        let labels = bucket_labels(&"team=ml".parse().unwrap());
        assert_eq!(labels.get("purpose"), Some("model-storage"));
        assert_eq!(labels.get("team"), Some("ml"));

        let labels = bucket_labels(&"purpose=custom".parse().unwrap());
        assert_eq!(labels.get("purpose"), Some("custom"));
    }
}

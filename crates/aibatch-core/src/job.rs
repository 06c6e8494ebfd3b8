//! Batch prediction job submission.
use aibatch_model::{MAX_RESOURCE_NAME_LEN, ModelError, ModelSource, Namer, ResolvedJobSpec};
use tracing::{debug, instrument};

use crate::{
    bucket::ArtifactsBucket,
    deploy::ModelDeployment,
    engine::{
        BatchPredictionJobArgs, Engine, Resource, ResourceArgs, ResourceOptions, ResourceRef,
        ResourceRequest,
    },
    error::StepError,
    id::next_job_suffix,
    identity::ServiceIdentity,
    upload::UploadedObject,
};

/// Everything the job waits for or reads from earlier steps.
pub struct JobInputs<'a> {
    pub bucket: &'a ArtifactsBucket,
    pub identity: &'a ServiceIdentity,
    /// `None` for catalog models.
    pub deployment: Option<&'a ModelDeployment>,
    pub role_bindings: &'a [Resource],
    pub registry_binding: Option<&'a Resource>,
    pub input_objects: &'a [UploadedObject],
}

/// Input and output locations of the job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobUris {
    /// Glob over the uploaded input prefix.
    pub input: String,
    pub output_prefix: String,
}

impl JobUris {
    pub fn compose(spec: &ResolvedJobSpec, bucket: &ArtifactsBucket) -> Self {
        let input = format!(
            "{}/{}",
            bucket.uri(&spec.input.bucket_path),
            spec.input.file_pattern
        );
        // the output prefix is passed through as given, trailing slash included
        let output_prefix = format!(
            "{}/{}",
            bucket.url(),
            spec.output.path.trim_start_matches('/')
        );
        Self {
            input,
            output_prefix,
        }
    }
}

/// The submitted job.
#[derive(Clone, Debug)]
pub struct BatchJob {
    pub resource: Resource,
    pub id: String,
    pub name: String,
    pub display_name: String,
    /// State reported by the platform at submission time.
    pub state: String,
    pub model: String,
    pub uris: JobUris,
}

/// Logical name of a job submission: `<component>-batch-prediction-job-<millis>`.
///
/// Every call yields a new name, so each run appends a job instead of
/// updating the previous one.
pub fn job_resource_name(namer: &Namer) -> String {
    namer.resource_name(
        "batch-prediction-job",
        &next_job_suffix().to_string(),
        MAX_RESOURCE_NAME_LEN,
    )
}

/// Submit one batch prediction job.
///
/// The job waits for the bucket, the deployment (if any), every role binding,
/// the registry binding (if any) and every uploaded input object.
#[instrument(level = "debug", skip_all)]
pub async fn submit_batch_job(
    engine: &dyn Engine,
    spec: &ResolvedJobSpec,
    namer: &Namer,
    parent: &ResourceRef,
    inputs: JobInputs<'_>,
) -> Result<BatchJob, StepError> {
    let model = match (&spec.model, inputs.deployment) {
        (_, Some(deployment)) => deployment.model_name.clone(),
        (ModelSource::Catalog { name }, None) => name.clone(),
        (ModelSource::Directory { .. }, None) => {
            // a directory model is always deployed before the job
            return Err(StepError::Spec(ModelError::MissingModelSource));
        }
    };
    let uris = JobUris::compose(spec, inputs.bucket);

    let mut options = ResourceOptions::new()
        .parent(parent)
        .depends_on([inputs.bucket.reference()])
        .depends_on(inputs.deployment.map(ModelDeployment::reference))
        .depends_on(inputs.registry_binding.map(Resource::reference))
        .depends_on(inputs.role_bindings.iter().map(Resource::reference))
        .depends_on(inputs.input_objects.iter().map(|o| &o.resource));
    options.retain_on_delete = spec.retain_job_on_delete.is_enabled();

    let request = ResourceRequest::new(
        job_resource_name(namer),
        ResourceArgs::BatchPredictionJob(BatchPredictionJobArgs {
            project: spec.project.clone(),
            location: spec.region.clone(),
            display_name: spec.job_display_name.clone(),
            model: model.clone(),
            instances_format: spec.input.format.clone(),
            input_uris: vec![uris.input.clone()],
            predictions_format: spec.output.format.clone(),
            output_uri_prefix: uris.output_prefix.clone(),
            machine: spec.machine.clone(),
            batch_size: spec.batch_size,
            service_account: inputs.identity.email.clone(),
            labels: spec.labels.clone(),
            network: spec.network.clone(),
            subnet: spec.subnet.clone(),
        }),
    )
    .with_options(options);

    let resource = engine.register(request).await?;
    let job = BatchJob {
        id: resource.id.clone(),
        name: resource.output("name")?.to_string(),
        display_name: resource.output("display_name")?.to_string(),
        state: resource.output("state")?.to_string(),
        model,
        uris,
        resource,
    };
    debug!(job = %job.name, state = %job.state, "batch prediction job declared");
    Ok(job)
}

#[cfg(test)]
mod tests {
    use aibatch_model::JobSpec;

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

    fn spec(output: Option<&str>, pattern: Option<&str>) -> ResolvedJobSpec {
        JobSpec {
            project: "p".into(),
            region: "us-central1".into(),
            model_name: Some("gemma".into()),
            output_data_path: output.map(Into::into),
            input_file_pattern: pattern.map(Into::into),
            ..Default::default()
        }
        .resolve("batch")
        .unwrap()
    }

    #[test]
    fn default_uris() {
        let uris = JobUris::compose(&spec(None, None), &bucket());
        assert_eq!(uris.input, "gs://batch-vertex-model-bucket/inputs/*.jsonl");
        assert_eq!(uris.output_prefix, "gs://batch-vertex-model-bucket/predictions/");
    }

    #[test]
    fn custom_output_and_pattern() {
        let uris = JobUris::compose(&spec(Some("/out/run1"), Some("part-*.jsonl")), &bucket());
        assert_eq!(uris.input, "gs://batch-vertex-model-bucket/inputs/part-*.jsonl");
        assert_eq!(uris.output_prefix, "gs://batch-vertex-model-bucket/out/run1");
    }

    #[test]
    fn job_names_are_unique_and_bounded() {
        let namer = Namer::new("a-rather-long-component-name-for-batch-inference");
        let a = job_resource_name(&namer);
        let b = job_resource_name(&namer);
        assert_ne!(a, b);
        assert!(a.len() <= MAX_RESOURCE_NAME_LEN);
        assert!(a.starts_with("a-rather-long"));
        assert!(a.contains("-batch-prediction-job-"), "{a}");
    }
}

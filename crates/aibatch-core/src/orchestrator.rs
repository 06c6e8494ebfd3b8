//! Sequences the provisioning steps of one batch inference deployment.
use std::sync::Arc;

use aibatch_model::{ArtifactKind, JobSpec, Namer};
use tracing::{debug, info, instrument, warn};

use crate::{
    bucket::create_artifacts_bucket,
    deploy::deploy_model,
    engine::{COMPONENT_TYPE, ComponentArgs, Engine, ResourceArgs, ResourceRequest},
    error::{CoreError, Step, StepError},
    identity::{bind_model_roles, create_service_account, grant_registry_access},
    job::{JobInputs, submit_batch_job},
    outputs::DeploymentResult,
    upload::Uploader,
};

/// Orchestrator over an [`Engine`].
///
/// One call to [`AiBatch::deploy`] declares:
/// 1. the component resource owning everything else;
/// 2. the model service account and its role bindings (plus the registry
///    binding when private registry access is requested);
/// 3. the artifacts bucket, model artifacts and input data objects;
/// 4. the model deployment (local model directories only);
/// 5. the batch prediction job.
///
/// Each step passes the resources it produced to the next as explicit
/// dependencies. The first failing step aborts the run; nothing is retried or
/// rolled back here.
pub struct AiBatch {
    engine: Arc<dyn Engine>,
}

impl AiBatch {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self { engine }
    }

    /// Validate `spec`, then declare every resource of the deployment named `component`.
    ///
    /// Validation errors are returned before anything is declared.
    #[instrument(level = "info", skip_all, fields(component = %component))]
    pub async fn deploy(&self, component: &str, spec: JobSpec) -> Result<DeploymentResult, CoreError> {
        let spec = spec.resolve(component).inspect_err(|e| {
            warn!(error = %e, "invalid job spec");
        })?;
        debug!(?spec, "job spec resolved");

        let engine = self.engine.as_ref();
        let namer = Namer::new(component);

        info!("registering component");
        let component = engine
            .register(ResourceRequest::new(
                component,
                ResourceArgs::Component(ComponentArgs {
                    type_token: COMPONENT_TYPE.to_string(),
                }),
            ))
            .await
            .in_step(Step::RegisterComponent)?;
        let parent = component.reference();

        info!("creating model service account");
        let identity = create_service_account(engine, &spec, &namer, parent)
            .await
            .in_step(Step::CreateServiceAccount)?;

        info!("granting model IAM roles");
        let role_bindings = bind_model_roles(engine, &spec, &namer, &identity, parent)
            .await
            .in_step(Step::GrantModelRoles)?;

        let registry_binding = if spec.enable_private_registry_access.is_enabled() {
            info!("granting registry IAM access");
            Some(
                grant_registry_access(engine, &spec, &namer, &identity, parent)
                    .await
                    .in_step(Step::GrantRegistryAccess)?,
            )
        } else {
            None
        };

        info!("creating artifacts bucket");
        let bucket = create_artifacts_bucket(engine, &spec, &namer, parent)
            .await
            .in_step(Step::CreateArtifactsBucket)?;
        let uploader = Uploader::new(engine, &bucket.name, bucket.reference(), parent);

        info!("uploading model artifacts");
        let model_objects = uploader
            .upload(
                spec.model_dir(),
                &spec.model_bucket_base_path,
                ArtifactKind::ModelArtifact,
            )
            .await
            .in_step(Step::UploadModel)?;

        info!("uploading input data");
        let input_objects = uploader
            .upload(
                Some(spec.input.local_dir.as_path()),
                &spec.input.bucket_path,
                ArtifactKind::InputData,
            )
            .await
            .in_step(Step::UploadInputData)?;

        info!("deploying model");
        let deployment = deploy_model(
            engine,
            &spec,
            &namer,
            parent,
            &bucket,
            &identity,
            &model_objects,
        )
        .await
        .in_step(Step::DeployModel)?;

        info!("submitting batch prediction job");
        let job = submit_batch_job(
            engine,
            &spec,
            &namer,
            parent,
            JobInputs {
                bucket: &bucket,
                identity: &identity,
                deployment: deployment.as_ref(),
                role_bindings: &role_bindings,
                registry_binding: registry_binding.as_ref(),
                input_objects: &input_objects,
            },
        )
        .await
        .in_step(Step::SubmitBatchJob)?;

        info!(
            job = %job.name,
            state = %job.state,
            model_objects = model_objects.len(),
            input_objects = input_objects.len(),
            "batch deployment declared"
        );

        let mut uploaded_objects = model_objects;
        uploaded_objects.extend(input_objects);

        Ok(DeploymentResult {
            service_account_email: identity.email,
            job_id: job.id,
            job_name: job.name,
            job_display_name: job.display_name,
            job_state: job.state,
            model: job.model,
            model_image_url: deployment.as_ref().map(|d| d.image_url.clone()),
            model_artifacts_bucket_uri: deployment.as_ref().map(|d| d.uris.artifacts.clone()),
            model_deployment_id: deployment.as_ref().map(|d| d.resource.id.clone()),
            deployed_model_id: deployment.as_ref().map(|d| d.deployed_model_id.clone()),
            input_schema_uri: deployment.as_ref().map(|d| d.uris.input_schema.clone()),
            output_schema_uri: deployment.as_ref().map(|d| d.uris.output_schema.clone()),
            behavior_schema_uri: deployment.and_then(|d| d.uris.behavior_schema),
            artifacts_bucket_name: bucket.name,
            uploaded_objects,
            input_data_uri: job.uris.input,
            output_data_uri_prefix: job.uris.output_prefix,
        })
    }
}

/// Attach the failing step to a step result.
trait InStep<T> {
    fn in_step(self, step: Step) -> Result<T, CoreError>;
}

impl<T, E> InStep<T> for Result<T, E>
where
    E: Into<StepError>,
{
    fn in_step(self, step: Step) -> Result<T, CoreError> {
        self.map_err(|e| {
            let source = e.into();
            warn!(%step, error = %source, "step failed");
            CoreError::Step { step, source }
        })
    }
}

//! Model deployment: composes artifact and schema URIs and hands them to the
//! model-deployment resource.
use aibatch_model::{MAX_RESOURCE_NAME_LEN, ModelSource, Namer, ResolvedJobSpec, normalize_key};
use tracing::{debug, info, instrument};

use crate::{
    bucket::ArtifactsBucket,
    engine::{Engine, ModelDeploymentArgs, Resource, ResourceArgs, ResourceOptions, ResourceRef, ResourceRequest},
    error::StepError,
    identity::ServiceIdentity,
    upload::UploadedObject,
};

pub const PREDICT_ROUTE: &str = "/predict";
pub const HEALTH_ROUTE: &str = "/health";

/// URIs derived from the artifacts location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelUris {
    pub artifacts: String,
    pub input_schema: String,
    pub output_schema: String,
    pub behavior_schema: Option<String>,
}

impl ModelUris {
    /// Schema URIs are the artifacts URI plus the schema path relative to the model directory.
    pub fn compose(
        artifacts: String,
        input_schema: &str,
        output_schema: &str,
        behavior_schema: Option<&str>,
    ) -> Self {
        let under = |rel: &str| format!("{artifacts}/{}", normalize_key(rel));
        Self {
            input_schema: under(input_schema),
            output_schema: under(output_schema),
            behavior_schema: behavior_schema.map(under),
            artifacts,
        }
    }
}

/// The declared deployment.
#[derive(Clone, Debug)]
pub struct ModelDeployment {
    pub resource: Resource,
    /// Model resource name the batch job runs against.
    pub model_name: String,
    pub deployed_model_id: String,
    pub image_url: String,
    pub uris: ModelUris,
}

impl ModelDeployment {
    pub fn reference(&self) -> &ResourceRef {
        self.resource.reference()
    }
}

/// Deploy the uploaded model.
///
/// Returns `None` for catalog models: there is nothing to deploy and the job
/// references the catalog name directly. The deployment waits for the bucket
/// and every uploaded model object.
#[instrument(level = "debug", skip_all, fields(objects = model_objects.len()))]
pub async fn deploy_model(
    engine: &dyn Engine,
    spec: &ResolvedJobSpec,
    namer: &Namer,
    parent: &ResourceRef,
    bucket: &ArtifactsBucket,
    identity: &ServiceIdentity,
    model_objects: &[UploadedObject],
) -> Result<Option<ModelDeployment>, StepError> {
    let ModelSource::Directory {
        input_schema_path,
        output_schema_path,
        behavior_schema_path,
        ..
    } = &spec.model
    else {
        info!("catalog model, skipping deployment");
        return Ok(None);
    };

    let uris = ModelUris::compose(
        bucket.uri(&spec.model_bucket_base_path),
        input_schema_path,
        output_schema_path,
        behavior_schema_path.as_deref(),
    );

    let request = ResourceRequest::new(
        namer.resource_name("vertex-model-deployment", "", MAX_RESOURCE_NAME_LEN),
        ResourceArgs::ModelDeployment(ModelDeploymentArgs {
            project_id: spec.project.clone(),
            region: spec.region.clone(),
            display_name: spec.model_display_name.clone(),
            model_artifacts_bucket_uri: uris.artifacts.clone(),
            model_image_url: spec.model_image_url.clone(),
            model_prediction_input_schema_uri: uris.input_schema.clone(),
            model_prediction_output_schema_uri: uris.output_schema.clone(),
            model_prediction_behavior_schema_uri: uris.behavior_schema.clone(),
            service_account: identity.email.clone(),
            predict_route: PREDICT_ROUTE.to_string(),
            health_route: HEALTH_ROUTE.to_string(),
            machine: spec.machine.clone(),
        }),
    )
    .with_options(
        ResourceOptions::new()
            .parent(parent)
            .depends_on([bucket.reference()])
            .depends_on(model_objects.iter().map(|o| &o.resource)),
    );

    let resource = engine.register(request).await?;
    let deployment = ModelDeployment {
        model_name: resource.output("model_name")?.to_string(),
        deployed_model_id: resource.output("deployed_model_id")?.to_string(),
        image_url: spec.model_image_url.clone(),
        uris,
        resource,
    };
    debug!(model = %deployment.model_name, "model deployment declared");
    Ok(Some(deployment))
}

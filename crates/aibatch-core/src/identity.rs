//! Service identity of the deployment and its role bindings.
use aibatch_model::{MAX_ACCOUNT_ID_LEN, MAX_RESOURCE_NAME_LEN, ModelError, Namer, ResolvedJobSpec};
use tracing::{debug, instrument, warn};

use crate::{
    engine::{
        Engine, IamMemberArgs, RepositoryIamMemberArgs, Resource, ResourceArgs, ResourceOptions,
        ResourceRef, ResourceRequest, ServiceAccountArgs,
    },
    error::StepError,
};

/// Project roles granted to the model service account.
///
/// Bucket listing, object writes for predictions, log and metric writes, and
/// access to the ML platform.
pub const MODEL_ROLES: [&str; 5] = [
    "roles/storage.bucketViewer",
    "roles/storage.objectCreator",
    "roles/logging.logWriter",
    "roles/monitoring.metricWriter",
    "roles/aiplatform.user",
];

/// Role granted on the image repository when private registry access is on.
pub const REGISTRY_READER_ROLE: &str = "roles/artifactregistry.reader";

const SERVICE_ACCOUNT_DESCRIPTION: &str = "Service account for deployed model operations";

/// The created service account.
#[derive(Clone, Debug)]
pub struct ServiceIdentity {
    pub resource: Resource,
    pub email: String,
}

impl ServiceIdentity {
    /// IAM member string of the account.
    pub fn member(&self) -> String {
        format!("serviceAccount:{}", self.email)
    }

    pub fn reference(&self) -> &ResourceRef {
        self.resource.reference()
    }
}

#[instrument(level = "debug", skip_all)]
pub async fn create_service_account(
    engine: &dyn Engine,
    spec: &ResolvedJobSpec,
    namer: &Namer,
    parent: &ResourceRef,
) -> Result<ServiceIdentity, StepError> {
    let account_id = namer.resource_name("model-account", "", MAX_ACCOUNT_ID_LEN);
    let request = ResourceRequest::new(
        namer.resource_name("model-account", "", MAX_RESOURCE_NAME_LEN),
        ResourceArgs::ServiceAccount(ServiceAccountArgs {
            project: spec.project.clone(),
            account_id,
            display_name: format!("{} Vertex AI Service Account", spec.model_display_name),
            description: SERVICE_ACCOUNT_DESCRIPTION.to_string(),
        }),
    )
    .with_options(ResourceOptions::new().parent(parent));

    let resource = engine.register(request).await?;
    let email = resource.output("email")?.to_string();
    debug!(%email, "service account declared");
    Ok(ServiceIdentity { resource, email })
}

/// Bind every role of [`MODEL_ROLES`] to the account, one declaration per role.
///
/// Bindings are declared in order; the first failure stops the loop and names
/// the role. Bindings declared before it are left to the engine's state.
#[instrument(level = "debug", skip_all, fields(member = %identity.email))]
pub async fn bind_model_roles(
    engine: &dyn Engine,
    spec: &ResolvedJobSpec,
    namer: &Namer,
    identity: &ServiceIdentity,
    parent: &ResourceRef,
) -> Result<Vec<Resource>, StepError> {
    let member = identity.member();
    let mut bindings = Vec::with_capacity(MODEL_ROLES.len());

    for role in MODEL_ROLES {
        let request = ResourceRequest::new(
            namer.resource_name("model-sa-iam", role, MAX_RESOURCE_NAME_LEN),
            ResourceArgs::ProjectIamMember(IamMemberArgs {
                project: spec.project.clone(),
                role: role.to_string(),
                member: member.clone(),
            }),
        )
        .with_options(
            ResourceOptions::new()
                .parent(parent)
                .depends_on([identity.reference()]),
        );

        match engine.register(request).await {
            Ok(binding) => bindings.push(binding),
            Err(source) => {
                warn!(%role, bound = bindings.len(), "role binding failed");
                return Err(StepError::RoleBinding {
                    role: role.to_string(),
                    source,
                });
            }
        }
    }
    Ok(bindings)
}

/// Grant read access on the repository hosting the serving image.
#[instrument(level = "debug", skip_all, fields(image = %spec.model_image_url))]
pub async fn grant_registry_access(
    engine: &dyn Engine,
    spec: &ResolvedJobSpec,
    namer: &Namer,
    identity: &ServiceIdentity,
    parent: &ResourceRef,
) -> Result<Resource, StepError> {
    let repository = spec
        .registry_repository()
        .ok_or_else(|| ModelError::InvalidImageUrl(spec.model_image_url.clone()))?;

    let request = ResourceRequest::new(
        namer.resource_name("model-registry-access", "iam-member", MAX_RESOURCE_NAME_LEN),
        ResourceArgs::RepositoryIamMember(RepositoryIamMemberArgs {
            project: spec.project.clone(),
            location: spec.region.clone(),
            repository: repository.to_string(),
            role: REGISTRY_READER_ROLE.to_string(),
            member: identity.member(),
        }),
    )
    .with_options(
        ResourceOptions::new()
            .parent(parent)
            .depends_on([identity.reference()]),
    );

    let binding = engine.register(request).await?;
    debug!(%repository, "registry access granted");
    Ok(binding)
}

use std::fmt;

use aibatch_model::ModelError;
use thiserror::Error;

use crate::{engine::EngineError, upload::UploadError};

/// Stage of the provisioning sequence, used to attribute failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    RegisterComponent,
    CreateServiceAccount,
    GrantModelRoles,
    GrantRegistryAccess,
    CreateArtifactsBucket,
    UploadModel,
    UploadInputData,
    DeployModel,
    SubmitBatchJob,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::RegisterComponent => "register component resource",
            Step::CreateServiceAccount => "create model service account",
            Step::GrantModelRoles => "grant model IAM roles",
            Step::GrantRegistryAccess => "grant registry IAM access",
            Step::CreateArtifactsBucket => "create artifacts bucket",
            Step::UploadModel => "upload model to bucket",
            Step::UploadInputData => "upload input data to bucket",
            Step::DeployModel => "deploy model",
            Step::SubmitBatchJob => "create batch prediction job",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root cause of a failed step.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("failed to bind role {role}: {source}")]
    RoleBinding {
        role: String,
        #[source]
        source: EngineError,
    },

    #[error(transparent)]
    Spec(#[from] ModelError),
}

/// Error returned by [`crate::orchestrator::AiBatch::deploy`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// The job spec is invalid; nothing was declared.
    #[error(transparent)]
    Config(#[from] ModelError),

    #[error("failed to {step}: {source}")]
    Step {
        step: Step,
        #[source]
        source: StepError,
    },
}

impl CoreError {
    /// Failed step, `None` for configuration errors.
    pub fn step(&self) -> Option<Step> {
        match self {
            CoreError::Config(_) => None,
            CoreError::Step { step, .. } => Some(*step),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_names_the_step() {
        let err = CoreError::Step {
            step: Step::GrantModelRoles,
            source: StepError::RoleBinding {
                role: "roles/logging.logWriter".into(),
                source: EngineError::Rejected {
                    resource: "binding".into(),
                    reason: "denied".into(),
                },
            },
        };
        assert_eq!(
            err.to_string(),
            "failed to grant model IAM roles: failed to bind role roles/logging.logWriter: \
             declaration of binding rejected: denied"
        );
        assert_eq!(err.step(), Some(Step::GrantModelRoles));
    }

    #[test]
    fn config_errors_keep_literal_message() {
        let err = CoreError::from(ModelError::MissingRegion);
        assert_eq!(err.to_string(), "region is required");
        assert_eq!(err.step(), None);
    }
}

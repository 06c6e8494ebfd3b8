pub mod bucket;
pub mod deploy;
pub mod engine;
pub mod error;
mod id;
pub mod identity;
pub mod job;
pub mod orchestrator;
pub mod outputs;
pub mod upload;

pub mod prelude {
    pub use crate::engine::{Engine, EngineError, PlanEngine, ResourcePlan};
    pub use crate::error::{CoreError, Step, StepError};
    pub use crate::orchestrator::AiBatch;
    pub use crate::outputs::DeploymentResult;
    pub use crate::upload::{UploadError, UploadManifest, UploadedObject, Uploader};
}

//! Contract with the infrastructure engine that owns the resource graph.
//!
//! The orchestrator never talks to cloud APIs itself. It declares resources
//! (typed arguments plus ownership and ordering options) and receives the
//! resolved outputs. Diffing, state persistence, retries and parallel apply
//! are the engine's business.
mod args;
pub use args::{
    BatchPredictionJobArgs, BucketArgs, BucketObjectArgs, COMPONENT_TYPE, ComponentArgs,
    IamMemberArgs, ModelDeploymentArgs, RepositoryIamMemberArgs, ResourceArgs,
    ServiceAccountArgs,
};

mod error;
pub use error::EngineError;

mod plan;
pub use plan::{PlanEngine, PlannedResource, ResourcePlan};

mod resource;
pub use resource::{Outputs, Resource, ResourceKind, ResourceOptions, ResourceRef, ResourceRequest};

use async_trait::async_trait;

/// Infrastructure engine used by the orchestrator.
///
/// Implementations must:
/// - reject a second declaration under an already used name;
/// - reject parents and dependencies that were never declared;
/// - return the outputs of the resource kind (see the component modules for
///   the keys each step reads).
#[async_trait]
pub trait Engine: Send + Sync {
    /// Declare one resource and wait for its outputs.
    async fn register(&self, request: ResourceRequest) -> Result<Resource, EngineError>;
}

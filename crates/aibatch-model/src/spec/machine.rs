#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Autoscaling bounds of the dedicated batch resources.
///
/// Invariant: `starting <= max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ReplicaBounds {
    pub starting: u32,
    pub max: u32,
}

impl ReplicaBounds {
    /// Fails when `max` is lower than `starting`.
    pub fn new(starting: u32, max: u32) -> ModelResult<Self> {
        if max < starting {
            return Err(ModelError::InvalidReplicaBounds);
        }
        Ok(Self { starting, max })
    }
}

/// Compute sizing of the batch prediction job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    /// Machine type, e.g. `n1-standard-4`.
    pub machine_type: String,
    /// Platform accelerator enum value, e.g. `NVIDIA_TESLA_T4`.
    pub accelerator_type: String,
    pub accelerator_count: u32,
    pub replicas: ReplicaBounds,
}

impl MachineSpec {
    /// True when an accelerator other than the unspecified placeholder is requested.
    pub fn has_accelerator(&self) -> bool {
        self.accelerator_type != crate::defaults::ACCELERATOR_TYPE
    }
}

use std::str::FromStr;

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Opt-in boolean switch.
///
/// Unlike a bare `bool` the default is spelled out: every flag of a job spec
/// is disabled unless the caller turns it on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(transparent)]
pub struct Flag(bool);

impl Flag {
    /// Returns an enabled flag.
    pub const fn enabled() -> Self {
        Self(true)
    }

    /// Returns a disabled flag.
    pub const fn disabled() -> Self {
        Self(false)
    }

    /// Returns `true` if the flag is on.
    pub const fn is_enabled(&self) -> bool {
        self.0
    }

    /// Returns `true` if the flag is off.
    pub const fn is_disabled(&self) -> bool {
        !self.0
    }
}

impl From<bool> for Flag {
    fn from(b: bool) -> Self {
        Self(b)
    }
}

impl From<Flag> for bool {
    fn from(f: Flag) -> Self {
        f.0
    }
}

impl FromStr for Flag {
    type Err = ModelError;

    /// Accepts the usual env-var spellings, case-insensitive.
    /// An empty value means disabled.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Flag::enabled()),
            "false" | "0" | "no" | "off" | "" => Ok(Flag::disabled()),
            _ => Err(ModelError::InvalidFlag(s.to_string())),
        }
    }
}

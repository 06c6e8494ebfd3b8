use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::LoggerError;

/// A validated `EnvFilter` expression such as `info` or `aibatch_core=debug,info`.
///
/// The raw string is kept so the config can be logged and serialized back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LoggerLevel(String);

impl LoggerLevel {
    /// Creates a level from a filter expression, validating it.
    ///
    /// ```
    /// use aibatch_observe::LoggerLevel;
    ///
    /// let lvl = LoggerLevel::new("aibatch_core=trace,info").unwrap();
    /// assert_eq!(lvl.as_str(), "aibatch_core=trace,info");
    /// ```
    pub fn new(s: impl Into<String>) -> Result<Self, LoggerError> {
        Self::try_from(s.into())
    }

    /// Returns the filter expression exactly as configured.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the `EnvFilter` for this expression.
    pub fn to_env_filter(&self) -> Result<EnvFilter, LoggerError> {
        EnvFilter::try_new(&self.0).map_err(|e| LoggerError::InvalidLevel(format!("{}: {e}", self.0)))
    }
}

impl Default for LoggerLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl FromStr for LoggerLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for LoggerLevel {
    type Error = LoggerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let s = s.trim().to_string();
        if s.is_empty() {
            return Err(LoggerError::InvalidLevel("empty filter".to_string()));
        }
        EnvFilter::try_new(&s)
            .map(|_| LoggerLevel(s.clone()))
            .map_err(|e| LoggerError::InvalidLevel(format!("{s}: {e}")))
    }
}

impl From<LoggerLevel> for String {
    fn from(l: LoggerLevel) -> Self {
        l.0
    }
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

use crate::error::LoggerError;

/// Timezone of log timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggerTimeZone {
    #[default]
    Utc,
    /// System offset, detected once when the logger is installed.
    Local,
}

impl LoggerTimeZone {
    /// Resolve to a fixed offset.
    ///
    /// Local offset detection only succeeds while the process is still
    /// single-threaded; on failure this falls back to UTC.
    pub fn offset(&self) -> UtcOffset {
        match self {
            LoggerTimeZone::Utc => UtcOffset::UTC,
            LoggerTimeZone::Local => UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }
}

impl FromStr for LoggerTimeZone {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" => Ok(Self::Utc),
            "local" => Ok(Self::Local),
            _ => Err(LoggerError::InvalidTimeZone(s.to_string())),
        }
    }
}

impl fmt::Display for LoggerTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoggerTimeZone::Utc => "utc",
            LoggerTimeZone::Local => "local",
        })
    }
}

/// RFC 3339 timestamps at a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct Rfc3339Timer {
    offset: UtcOffset,
}

impl Rfc3339Timer {
    /// Creates a timer, resolving the offset of `tz` now.
    pub fn new(tz: LoggerTimeZone) -> Self {
        Self { offset: tz.offset() }
    }

    fn now(&self) -> Option<String> {
        OffsetDateTime::now_utc()
            .to_offset(self.offset)
            .format(&Rfc3339)
            .ok()
    }
}

impl FormatTime for Rfc3339Timer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        match self.now() {
            Some(ts) => write!(w, "{ts} "),
            None => write!(w, "<invalid-time> "),
        }
    }
}

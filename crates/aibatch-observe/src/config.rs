use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::{LoggerFormat, LoggerLevel, LoggerTimeZone};

/// Logger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// Filter expression, e.g. `info` or `aibatch_core=debug,info`.
    pub level: LoggerLevel,
    pub tz: LoggerTimeZone,
    /// Include event targets (module paths) in the output.
    pub with_targets: bool,
    /// Allow ANSI colors in text output.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            tz: LoggerTimeZone::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    /// Colors are used only when enabled and stdout is a terminal.
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}

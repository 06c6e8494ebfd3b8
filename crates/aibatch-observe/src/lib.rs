//! Logging setup shared by the aibatch binaries.
mod config;
mod error;
mod format;
mod init;
mod level;
mod timer;

pub use config::LoggerConfig;
pub use error::{LoggerError, LoggerResult};
pub use format::LoggerFormat;
pub use init::init_logger;
pub use level::LoggerLevel;
pub use timer::{LoggerTimeZone, Rfc3339Timer};

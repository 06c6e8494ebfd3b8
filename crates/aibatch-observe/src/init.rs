use tracing::Subscriber;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{LoggerConfig, LoggerError, LoggerFormat, LoggerResult, Rfc3339Timer};

/// Install the global tracing subscriber described by `cfg`.
///
/// With [`LoggerTimeZone::Local`](crate::LoggerTimeZone::Local) the offset is
/// detected here, so call this before starting a multi-threaded runtime.
///
/// ```no_run
/// use aibatch_observe::{LoggerConfig, init_logger};
///
/// init_logger(&LoggerConfig::default()).expect("logger");
/// tracing::info!("logger initialized");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => text(cfg),
        LoggerFormat::Json => json(cfg),
        LoggerFormat::Journald => journald(cfg),
    }
}

fn text(cfg: &LoggerConfig) -> LoggerResult<()> {
    let layer = fmt::layer()
        .with_ansi(cfg.should_use_color())
        .with_target(cfg.with_targets)
        .with_timer(Rfc3339Timer::new(cfg.tz));

    let subscriber = tracing_subscriber::registry()
        .with(cfg.level.to_env_filter()?)
        .with(layer);
    install(subscriber)
}

fn json(cfg: &LoggerConfig) -> LoggerResult<()> {
    let layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(cfg.with_targets)
        .with_timer(Rfc3339Timer::new(cfg.tz));

    let subscriber = tracing_subscriber::registry()
        .with(cfg.level.to_env_filter()?)
        .with(layer);
    install(subscriber)
}

#[cfg(target_os = "linux")]
fn journald(cfg: &LoggerConfig) -> LoggerResult<()> {
    let layer =
        tracing_journald::layer().map_err(|e| LoggerError::JournaldInitFailed(e.to_string()))?;

    let subscriber = tracing_subscriber::registry()
        .with(cfg.level.to_env_filter()?)
        .with(layer);
    install(subscriber)
}

#[cfg(not(target_os = "linux"))]
fn journald(_cfg: &LoggerConfig) -> LoggerResult<()> {
    Err(LoggerError::JournaldNotSupported)
}

fn install<S>(subscriber: S) -> LoggerResult<()>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The global subscriber can be set once per test binary, so a single
    // test covers both the first install and the rejected second one.
    #[test]
    fn second_install_is_rejected() {
        let cfg = LoggerConfig {
            format: LoggerFormat::Json,
            level: "aibatch_observe=debug,warn".parse().unwrap(),
            use_color: false,
            ..Default::default()
        };

        init_logger(&cfg).unwrap();
        tracing::debug!("installed");

        let err = init_logger(&LoggerConfig::default()).unwrap_err();
        assert!(matches!(err, LoggerError::AlreadyInitialized));
    }
}

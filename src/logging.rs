//! Logging setup
//!
//! Console output always goes through a `tracing_subscriber` fmt layer. When
//! `logging.log_to_file` is set, a second layer writes to a daily rolling
//! file via `tracing_appender`. `RUST_LOG` overrides the configured filter.

use crate::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file name prefix inside the log directory
pub const LOG_FILE_PREFIX: &str = "debugchart.log";

/// Build the log filter from the environment, falling back to the configured directive
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_LEVEL))
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer when dropped, so keep it alive
/// for the lifetime of the program.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let log_dir = config
        .log_to_file
        .then(|| config.resolved_log_dir())
        .flatten();
    let (file_writer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let file_layer = file_writer.map(|writer| {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
    });

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
    {
        eprintln!("Logging already initialised: {}", e);
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back() {
        let config = LoggingConfig {
            level: "not a [valid filter".to_string(),
            ..Default::default()
        };
        // Must not panic whatever RUST_LOG holds
        let _ = env_filter(&config);
    }

    #[test]
    fn test_file_logging_disabled_has_no_guard() {
        let config = LoggingConfig::default();
        assert!(init(&config).is_none());
    }
}

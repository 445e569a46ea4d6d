//! Logging setup for applications embedding the flows
//!
//! The flows only emit `tracing` events; installing a subscriber is left
//! to the application. These helpers cover the common setups.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Environment variable selecting the [`LoggingMode`]
pub const LOG_MODE_ENV: &str = "RXV_LOG_MODE";

/// Environment variable overriding the log filter
pub const LOG_LEVEL_ENV: &str = "RXV_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber installed
    Silent,
    /// Compact stderr output at info level
    Development,
    /// Pretty output with source locations at debug level
    Debug,
}

impl LoggingMode {
    /// Parse a mode name; unknown names yield `None`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "silent" => Some(LoggingMode::Silent),
            "development" => Some(LoggingMode::Development),
            "debug" => Some(LoggingMode::Debug),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
}

/// Install a global subscriber for `mode`.
///
/// # Environment Variables
///
/// - `RXV_LOG_LEVEL`: filter directives, e.g. `rxv_config_flow=debug`
/// - `RUST_LOG`: used when `RXV_LOG_LEVEL` is unset
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let filter = create_env_filter("info")?;

            Registry::default()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let filter = create_env_filter("debug")?;

            Registry::default()
                .with(
                    fmt::layer()
                        .pretty()
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Install a subscriber for the mode named by `RXV_LOG_MODE`.
///
/// Defaults to [`LoggingMode::Silent`] when unset or unrecognized.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = std::env::var(LOG_MODE_ENV)
        .ok()
        .and_then(|name| LoggingMode::from_name(&name))
        .unwrap_or(LoggingMode::Silent);

    init_logging(mode)
}

fn create_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var(LOG_LEVEL_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());

    EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidFilter(e.to_string()))
}

/// Whether a global subscriber is already installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_mode() {
        assert!(init_logging(LoggingMode::Silent).is_ok());
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(LoggingMode::from_name("debug"), Some(LoggingMode::Debug));
        assert_eq!(LoggingMode::from_name(" Development "), Some(LoggingMode::Development));
        assert_eq!(LoggingMode::from_name("silent"), Some(LoggingMode::Silent));
        assert_eq!(LoggingMode::from_name("loud"), None);
    }
}

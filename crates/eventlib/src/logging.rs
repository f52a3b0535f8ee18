//! Logging system setup.
//!
//! The bus itself only emits `tracing` events. Applications that do not
//! install their own subscriber can call [`setup_logging`] once at startup.

use crate::config::LoggingSettings;
use crate::error::LoggingError;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes a global tracing subscriber from `config`.
///
/// `RUST_LOG` takes precedence over `config.level` when it is set. Output is
/// human-readable unless `config.json_format` is true; both formats include
/// thread ids and names.
///
/// Fails if the level is not a valid filter directive or if a global
/// subscriber was already installed.
pub fn setup_logging(config: &LoggingSettings) -> Result<(), LoggingError> {
    let filter = build_filter(&config.level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()
    };
    installed.map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))?;

    info!("🔧 Logging initialized with level: {}", config.level);
    Ok(())
}

fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidFilter {
        directive: level.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_levels_and_directives() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(build_filter("debug").is_ok());
        assert!(build_filter("eventlib=trace,warn").is_ok());
    }

    #[test]
    fn test_invalid_directive_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let err = build_filter("eventlib=[").unwrap_err();
        assert!(matches!(err, LoggingError::InvalidFilter { .. }));
    }
}

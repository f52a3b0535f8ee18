//! Configuration for the event bus.
//!
//! Settings are loaded from TOML. Every field has a default, so an empty
//! document is a valid configuration:
//!
//! ```toml
//! [dispatch]
//! slow_handler_threshold_ms = 50
//! catch_panics = true
//!
//! [logging]
//! level = "info"
//! json_format = false
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

fn default_slow_handler_threshold_ms() -> u64 {
    50
}

fn default_catch_panics() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBusConfig {
    /// Dispatch behaviour
    #[serde(default)]
    pub dispatch: DispatchSettings,
    /// Logging setup used by [`setup_logging`](crate::logging::setup_logging)
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Settings applied on the dispatch path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSettings {
    /// Invocations slower than this are reported at error level
    #[serde(default = "default_slow_handler_threshold_ms")]
    pub slow_handler_threshold_ms: u64,
    /// Whether a panicking handler is treated like a failing one. When false,
    /// the panic unwinds out of `post`.
    #[serde(default = "default_catch_panics")]
    pub catch_panics: bool,
}

impl DispatchSettings {
    #[inline]
    pub fn slow_handler_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_handler_threshold_ms)
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            slow_handler_threshold_ms: default_slow_handler_threshold_ms(),
            catch_panics: default_catch_panics(),
        }
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl EventBusConfig {
    /// Parses and validates a configuration document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EventBusConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        info!("🔧 Loaded event bus configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.slow_handler_threshold_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dispatch.slow_handler_threshold_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "logging.level",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

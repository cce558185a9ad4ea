//! Layered configuration for the engine and per-watcher metadata.
//!
//! Global settings merge three layers, later layers winning:
//! - Default values
//! - `pathwatch.toml` in the working directory
//! - Environment variables prefixed with `PATHWATCH_`, double underscores
//!   separating nested levels (`PATHWATCH_LOGGING__DEFAULT=debug` sets
//!   `logging.default`)
//!
//! [`WatcherConfig`] is the per-watcher metadata carried alongside each
//! registered watcher. The engine never reads it; it only stores it and
//! hands it back on request.

use std::collections::HashMap;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::WatchError;

/// Global engine settings.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Defaults applied by the CLI when building watchers.
    #[serde(default)]
    pub watch: WatchDefaults,
}

impl Settings {
    /// Load settings from defaults, `pathwatch.toml`, and the environment.
    pub fn load() -> Result<Self, WatchError> {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("pathwatch.toml"))
            .merge(Env::prefixed("PATHWATCH_").split("__"))
            .extract()
            .map_err(|e| WatchError::InvalidConfig {
                reason: e.to_string(),
            })
    }
}

/// Log level configuration with per-module overrides.
///
/// `RUST_LOG` takes precedence over everything here.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level filter (error, warn, info, debug, trace).
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `watcher = "debug"`.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Watcher flags the CLI falls back to when no arguments are given.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct WatchDefaults {
    /// Watch directory trees recursively.
    #[serde(default)]
    pub recursive: bool,

    /// Keep consuming batches instead of stopping after the first.
    #[serde(default)]
    pub infinite: bool,
}

/// Per-watcher metadata stored by the manager.
///
/// Opaque to the engine: stored on registration, returned by
/// `watcher_configuration`, never read on the event path.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct WatcherConfig {
    /// Outbound notification channel identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// Per-watcher log verbosity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Timeout for downstream consumers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

//! Configuration types and defaults

use serde::{Deserialize, Serialize};
use sourcebuf_core::{BufferLimits, CoreError, CoreResult};

/// Environment variable enabling debug logging (`1` or `true`)
pub const DEBUG_LOGGING_ENV: &str = "SOURCEBUF_DEBUG_LOGGING";

/// Environment variable holding the log filter directives
pub const LOG_FILTER_ENV: &str = "RUST_LOG";

/// Global sourcebuf configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Install a `tracing` subscriber on init
    pub debug_logging: bool,
    /// Filter directives for that subscriber
    pub log_filter: String,
    /// Per-track buffer limits handed to every new source state
    pub buffer_limits: BufferLimits,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_filter: "info".to_string(),
            buffer_limits: BufferLimits::unlimited(),
        }
    }
}

impl GlobalConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup
    ///
    /// Missing variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let debug_logging = lookup(DEBUG_LOGGING_ENV)
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true"))
            .unwrap_or(defaults.debug_logging);

        Self {
            debug_logging,
            log_filter: lookup(LOG_FILTER_ENV).unwrap_or(defaults.log_filter),
            buffer_limits: BufferLimits::from_lookup(&lookup),
        }
    }

    /// Parse a JSON document; absent fields keep their defaults
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::InvalidConfiguration {
            field: "config".to_string(),
            reason: e.to_string(),
        })
    }
}

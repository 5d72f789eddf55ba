//! Configuration types

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Back-test engine connection
    #[serde(default)]
    pub engine: EngineConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

/// Remote back-test engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the engine REST API
    #[serde(default = "default_engine_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_engine_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

pub(crate) fn default_engine_url() -> String {
    "http://localhost:8080".to_string()
}

pub(crate) fn default_request_timeout() -> u64 {
    30
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Snapshot date used when a command is given none
    #[serde(default)]
    pub default_date: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_date: None,
        }
    }
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

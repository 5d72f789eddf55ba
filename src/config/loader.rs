//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;
use url::Url;

use super::types::{default_engine_url, default_log_level, default_request_timeout, AppConfig};
use crate::common::errors::{Result, WorkbenchError};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables prefixed with BACKTEST_ (`BACKTEST_ENGINE_URL`, ...)
/// 2. Environment variables prefixed with APP__ (`APP__ENGINE__BASE_URL`, ...)
/// 3. Configuration file (TOML format)
/// 4. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    );

    builder = builder
        .set_override_option("engine.base_url", std::env::var("BACKTEST_ENGINE_URL").ok())
        .and_then(|b| {
            b.set_override_option(
                "engine.request_timeout_seconds",
                std::env::var("BACKTEST_REQUEST_TIMEOUT").ok(),
            )
        })
        .and_then(|b| {
            b.set_override_option("settings.log_level", std::env::var("BACKTEST_LOG_LEVEL").ok())
        })
        .map_err(|e| WorkbenchError::Configuration(e.to_string()))?;

    let config = builder
        .build()
        .map_err(|e| WorkbenchError::Configuration(e.to_string()))?;

    let app: AppConfig = config
        .try_deserialize()
        .map_err(|e| WorkbenchError::Configuration(e.to_string()))?;

    validate(&app)?;
    Ok(app)
}

/// Load configuration from environment variables only
pub fn load_from_env() -> Result<AppConfig> {
    // Try to load from .env file
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<AppConfig> {
    let mut app = AppConfig::default();
    app.engine.base_url = lookup("BACKTEST_ENGINE_URL").unwrap_or_else(default_engine_url);
    app.engine.request_timeout_seconds = match lookup("BACKTEST_REQUEST_TIMEOUT") {
        Some(raw) => raw.trim().parse().map_err(|_| {
            WorkbenchError::Configuration(format!("BACKTEST_REQUEST_TIMEOUT '{}' is not a number", raw))
        })?,
        None => default_request_timeout(),
    };
    app.settings.log_level = lookup("BACKTEST_LOG_LEVEL").unwrap_or_else(default_log_level);
    app.settings.default_date = lookup("BACKTEST_DEFAULT_DATE");

    validate(&app)?;
    Ok(app)
}

fn validate(app: &AppConfig) -> Result<()> {
    Url::parse(&app.engine.base_url).map_err(|e| {
        WorkbenchError::Configuration(format!(
            "engine.base_url '{}' is not a valid URL: {}",
            app.engine.base_url, e
        ))
    })?;
    if app.engine.request_timeout_seconds == 0 {
        return Err(WorkbenchError::Configuration(
            "engine.request_timeout_seconds must be positive".to_string(),
        ));
    }
    Ok(())
}

//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{LogFormat, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {key}={value:?}: {reason}")]
    InvalidEnv {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Load configuration: defaults, then the optional TOML file, then process
/// environment overrides. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an explicit environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay non-empty environment values onto `config`.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| {
        env(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(host) = lookup("HOST") {
        config.listener.host = host;
    }
    if let Some(port) = lookup("PORT") {
        config.listener.port = parse_env("PORT", port)?;
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = lookup("LOG_FORMAT") {
        config.logging.format = parse_env::<LogFormat>("LOG_FORMAT", format)?;
    }
    if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
        config.timeouts.request_secs = parse_env("REQUEST_TIMEOUT_SECS", secs)?;
    }
    if let Some(secs) = lookup("SHUTDOWN_TIMEOUT_SECS") {
        config.timeouts.shutdown_secs = parse_env("SHUTDOWN_TIMEOUT_SECS", secs)?;
    }
    if let Some(name) = lookup("SERVICE_NAME") {
        config.service.name = name;
    }
    if let Some(version) = lookup("SERVICE_VERSION") {
        config.service.version = version;
    }
    if let Some(build_time) = lookup("BUILD_TIME") {
        config.service.build_time = build_time;
    }

    Ok(())
}

fn parse_env<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::InvalidEnv {
        key,
        reason: e.to_string(),
        value,
    })
}

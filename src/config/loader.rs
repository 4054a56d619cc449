//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ApiConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment variable {key}: {reason}")]
    Env { key: &'static str, reason: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override from the environment, and validate configuration.
///
/// Without a path the defaults are used, so a bare deployment can be driven
/// entirely by environment variables plus a users file.
pub fn load_config(path: Option<&Path>) -> Result<ApiConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ApiConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply the supported environment overrides through `lookup`.
pub fn apply_env_overrides<F>(config: &mut ApiConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secret) = lookup("JWT_SECRET_KEY") {
        config.auth.secret = secret;
    }
    if let Some(algorithm) = lookup("JWT_ALGORITHM") {
        config.auth.algorithm = algorithm;
    }
    if let Some(minutes) = lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
        config.auth.token_ttl_minutes = minutes.trim().parse().map_err(|e| ConfigError::Env {
            key: "ACCESS_TOKEN_EXPIRE_MINUTES",
            reason: format!("{e}"),
        })?;
    }
    if let Some(path) = lookup("IGS_DATABASE_PATH") {
        config.storage.database_path = path;
    }
    if let Some(addr) = lookup("IGS_BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
    Ok(())
}

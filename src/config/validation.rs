//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, token lifetime > 0)
//! - Check the credential list (unique usernames, parseable hashes)
//! - Check the signing secret and algorithm
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ApiConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use argon2::password_hash::PasswordHash;
use thiserror::Error;

use crate::auth::token::parse_algorithm;
use crate::config::schema::ApiConfig;

/// Minimum length of the HMAC signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_MINUTES: u64 = 365 * 24 * 60;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("auth.secret must be at least {MIN_SECRET_LEN} characters")]
    SecretTooShort,

    #[error("auth.algorithm '{0}' is not one of HS256, HS384, HS512")]
    Algorithm(String),

    #[error("auth.token_ttl_minutes must be between 1 and {MAX_TOKEN_TTL_MINUTES}")]
    TokenTtl,

    #[error("auth.users must list at least one account")]
    NoUsers,

    #[error("auth.users has an empty username")]
    EmptyUsername,

    #[error("auth.users lists '{0}' more than once")]
    DuplicateUser(String),

    #[error("auth.users entry '{0}' has an invalid password_hash")]
    PasswordHash(String),

    #[error("storage.database_path must not be empty")]
    DatabasePath,

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,

    #[error("rate_limit requires requests_per_second and burst_size greater than zero")]
    RateLimit,

    #[error("observability.log_format '{0}' is not one of pretty, json")]
    LogFormat(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ApiConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let auth = &config.auth;
    if auth.secret.len() < MIN_SECRET_LEN {
        errors.push(ValidationError::SecretTooShort);
    }
    if parse_algorithm(&auth.algorithm).is_none() {
        errors.push(ValidationError::Algorithm(auth.algorithm.clone()));
    }
    if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&auth.token_ttl_minutes) {
        errors.push(ValidationError::TokenTtl);
    }
    if auth.users.is_empty() {
        errors.push(ValidationError::NoUsers);
    }

    let mut seen = HashSet::new();
    for user in &auth.users {
        if user.username.trim().is_empty() {
            errors.push(ValidationError::EmptyUsername);
            continue;
        }
        if !seen.insert(user.username.as_str()) {
            errors.push(ValidationError::DuplicateUser(user.username.clone()));
        }
        if PasswordHash::new(&user.password_hash).is_err() {
            errors.push(ValidationError::PasswordHash(user.username.clone()));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ValidationError::DatabasePath);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    let rate = &config.rate_limit;
    if rate.enabled && (rate.requests_per_second == 0 || rate.burst_size == 0) {
        errors.push(ValidationError::RateLimit);
    }

    let obs = &config.observability;
    if !matches!(obs.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::LogFormat(obs.log_format.clone()));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

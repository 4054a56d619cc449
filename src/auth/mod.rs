//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! POST /token (username, password)
//!     → service.rs (look up account, verify argon2 hash)
//!     → token.rs (sign JWT: sub, iat, exp)
//!     → bearer token returned to caller
//!
//! Protected request (Authorization: Bearer ...)
//!     → http::middleware::auth (extract header)
//!     → service.rs (verify signature + expiry, subject still known)
//!     → AuthenticatedUser attached to request
//! ```
//!
//! # Design Decisions
//! - Stateless tokens: any instance holding the secret validates any token
//! - Unknown usernames still pay for a hash verification
//! - Error variants stay distinct internally; the HTTP boundary collapses
//!   them into one 401

pub mod password;
pub mod service;
pub mod token;

use thiserror::Error;

pub use service::AuthService;
pub use token::{Claims, Token, TokenSigner};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token expired")]
    Expired,

    #[error("malformed token")]
    Malformed,

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("auth configuration: {0}")]
    Config(String),
}

impl AuthError {
    /// Short label for logs and metrics. Never sent to clients.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Expired => "expired",
            AuthError::Malformed => "malformed",
            AuthError::Signing(_) => "signing",
            AuthError::Hashing(_) => "hashing",
            AuthError::Config(_) => "config",
        }
    }
}

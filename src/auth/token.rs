//! JWT bearer tokens.
//!
//! Tokens are HMAC-signed (HS256 by default) and carry only the subject,
//! issue time and absolute expiry. Validation uses zero leeway so a token is
//! rejected the second its `exp` passes.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;

/// Payload stored in the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token was issued for.
    pub sub: String,
    /// Issued at (Unix timestamp).
    pub iat: u64,
    /// Expiration time (Unix timestamp).
    pub exp: u64,
}

/// A freshly issued token.
#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: String,
    pub subject: String,
    pub expires_at: u64,
}

/// Map a configured algorithm name onto the HMAC family.
pub fn parse_algorithm(name: &str) -> Option<Algorithm> {
    match name.trim().to_ascii_uppercase().as_str() {
        "HS256" => Some(Algorithm::HS256),
        "HS384" => Some(Algorithm::HS384),
        "HS512" => Some(Algorithm::HS512),
        _ => None,
    }
}

/// Current Unix time in seconds.
pub fn unix_now() -> Result<u64, AuthError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AuthError::Signing(format!("system time error: {e}")))
}

/// Signs and verifies tokens with the shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, algorithm: Algorithm, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            ttl,
        }
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `subject` as if issued at `issued_at`.
    pub fn sign(&self, subject: &str, issued_at: u64) -> Result<Token, AuthError> {
        let exp = issued_at
            .checked_add(self.ttl.as_secs())
            .ok_or_else(|| AuthError::Signing("token expiry overflows".to_string()))?;
        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at,
            exp,
        };

        let access_token = encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(Token {
            access_token,
            subject: claims.sub,
            expires_at: claims.exp,
        })
    }

    /// Verify signature, algorithm and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed,
            })
    }
}

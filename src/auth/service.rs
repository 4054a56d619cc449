//! Credential checks and token issuance.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::auth::password::verify_password;
use crate::auth::token::{parse_algorithm, unix_now, Token, TokenSigner};
use crate::auth::AuthError;
use crate::config::AuthConfig;

/// Issues and validates bearer tokens for the configured accounts.
///
/// Constructed once at startup and shared behind an `Arc`.
pub struct AuthService {
    signer: TokenSigner,
    /// username → argon2 PHC hash
    users: HashMap<String, String>,
    /// Verified against when the username is unknown, so both failure paths
    /// cost one argon2 verification.
    decoy_hash: String,
}

impl AuthService {
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let algorithm = parse_algorithm(&config.algorithm)
            .ok_or_else(|| AuthError::Config(format!("unsupported algorithm {}", config.algorithm)))?;
        let ttl_secs = config.token_ttl_minutes.checked_mul(60).ok_or_else(|| {
            AuthError::Config(format!("token lifetime of {} minutes is too long", config.token_ttl_minutes))
        })?;
        let ttl = Duration::from_secs(ttl_secs);
        let signer = TokenSigner::new(&config.secret, algorithm, ttl);

        let users = config
            .users
            .iter()
            .map(|u| (u.username.clone(), u.password_hash.clone()))
            .collect();

        Self::new(signer, users)
    }

    pub fn new(signer: TokenSigner, users: HashMap<String, String>) -> Result<Self, AuthError> {
        let decoy_hash = users
            .values()
            .next()
            .cloned()
            .ok_or_else(|| AuthError::Config("no user accounts configured".into()))?;

        Ok(Self {
            signer,
            users,
            decoy_hash,
        })
    }

    /// Check credentials and issue a signed, time-limited token.
    ///
    /// Blocks for one argon2 verification; call from a blocking context.
    pub fn issue_token(&self, username: &str, password: &str) -> Result<Token, AuthError> {
        let stored = self.users.get(username);
        let hash = stored.unwrap_or(&self.decoy_hash);
        let matches = verify_password(password, hash)?;

        if stored.is_none() || !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.signer.sign(username, unix_now()?)?;
        debug!(user = %username, expires_at = token.expires_at, "Issued access token");
        Ok(token)
    }

    /// Verify a bearer token and return the username it was issued for.
    pub fn validate_token(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.signer.verify(token)?;

        if !self.users.contains_key(&claims.sub) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(claims.sub)
    }

    /// Configured token lifetime.
    pub fn token_ttl(&self) -> Duration {
        self.signer.ttl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::config::UserConfig;

    fn service() -> AuthService {
        let mut config = AuthConfig::default();
        config.users.push(UserConfig {
            username: "analyst".into(),
            password_hash: hash_password("correct-pass").unwrap(),
        });
        AuthService::from_config(&config).unwrap()
    }

    #[test]
    fn issued_token_validates_to_username() {
        let service = service();
        let token = service.issue_token("analyst", "correct-pass").unwrap();

        assert_eq!(token.subject, "analyst");
        assert_eq!(service.validate_token(&token.access_token).unwrap(), "analyst");
    }

    #[test]
    fn failures_do_not_reveal_which_factor() {
        let service = service();

        let wrong_password = service.issue_token("analyst", "nope").unwrap_err();
        let unknown_user = service.issue_token("mallory", "correct-pass").unwrap_err();

        assert_eq!(wrong_password, AuthError::InvalidCredentials);
        assert_eq!(unknown_user, wrong_password);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let service = service();
        let issued = unix_now().unwrap() - 2 * 3600;
        let token = service.signer.sign("analyst", issued).unwrap();

        assert_eq!(service.validate_token(&token.access_token), Err(AuthError::Expired));
    }

    #[test]
    fn token_for_removed_account_is_rejected() {
        let service = service();
        let token = service.signer.sign("former-analyst", unix_now().unwrap()).unwrap();

        assert_eq!(
            service.validate_token(&token.access_token),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn oversized_token_lifetime_is_a_config_error() {
        let mut config = AuthConfig::default();
        config.token_ttl_minutes = u64::MAX / 30;
        config.users.push(UserConfig {
            username: "analyst".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
        });

        assert!(matches!(AuthService::from_config(&config), Err(AuthError::Config(_))));
    }

    #[test]
    fn requires_at_least_one_account() {
        let result = AuthService::from_config(&AuthConfig::default());
        assert!(matches!(result, Err(AuthError::Config(_))));
    }
}

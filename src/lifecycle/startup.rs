//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the record store and seed it when configured
//! - Build the auth service from the credential list
//! - Assemble the shared `AppState`
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Seeding finishes before the listener is bound, so no request ever
//!   sees a half-populated table

use std::sync::Arc;

use thiserror::Error;

use crate::auth::{AuthError, AuthService};
use crate::config::{ApiConfig, StorageConfig};
use crate::http::server::AppState;
use crate::seed::{self, SeedError};
use crate::store::{StoreError, TractStore};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("record store: {0}")]
    Store(#[from] StoreError),

    #[error("seeding: {0}")]
    Seed(#[from] SeedError),

    #[error("auth: {0}")]
    Auth(#[from] AuthError),
}

/// Open the store and run the seeder if `seed_on_startup` is set.
pub fn prepare_store(config: &StorageConfig) -> Result<TractStore, StartupError> {
    let store = TractStore::open(&config.database_path)?;

    if config.seed_on_startup {
        if config.seed_files.is_empty() {
            seed::seed_builtin(&store)?;
        } else {
            seed::seed_files(&store, config.seed_files.as_slice())?;
        }
    }

    tracing::info!(tracts = store.count()?, "Record store ready");
    Ok(store)
}

/// Initialize every subsystem the HTTP layer depends on.
pub fn build_state(config: &ApiConfig) -> Result<AppState, StartupError> {
    let store = prepare_store(&config.storage)?;
    let auth = AuthService::from_config(&config.auth)?;

    tracing::info!(
        users = config.auth.users.len(),
        token_ttl_secs = auth.token_ttl().as_secs(),
        "Auth service ready"
    );

    Ok(AppState {
        auth: Arc::new(auth),
        store: Arc::new(store),
    })
}

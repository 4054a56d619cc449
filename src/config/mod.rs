//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides, .env via dotenvy in main)
//!     → validation.rs (semantic checks)
//!     → ApiConfig (validated, immutable)
//!     → handed to startup, which builds the shared AppState
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ApiConfig;
pub use schema::AuthConfig;
pub use schema::ObservabilityConfig;
pub use schema::RateLimitConfig;
pub use schema::StorageConfig;
pub use schema::UserConfig;

//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (check per-IP limits)
//!     → [bearer validation in http::middleware::auth]
//!     → handler
//!     → headers.rs (add security response headers)
//!
//! Ingestion:
//!     → sanitize.rs (strip markup before rows reach the store)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input
//! - Text is sanitized once, on write; reads return stored text as is

pub mod headers;
pub mod rate_limit;
pub mod sanitize;

pub use rate_limit::RateLimiter;
pub use sanitize::sanitize;

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, request span)
//!     → routes.rs (route table → handler)
//!     → middleware/auth.rs (bearer check on protected routes)
//!     → handlers.rs (auth service / record store)
//!     → error.rs (uniform status codes)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod routes;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use request::{RequestUuid, X_REQUEST_ID};
pub use server::{ApiServer, AppState};

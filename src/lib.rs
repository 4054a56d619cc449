//! IGS API library: census-tract inclusive-growth scores behind bearer auth.

pub mod auth;
pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod seed;
pub mod store;

pub use config::schema::ApiConfig;
pub use http::ApiServer;
pub use lifecycle::Shutdown;

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router from the route table
//! - Wire up middleware (tracing, request ID, timeouts, limits, headers)
//! - Bind server to listener
//! - Stop cleanly when the shutdown coordinator fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::DefaultBodyLimit, middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::AuthService;
use crate::config::ApiConfig;
use crate::http::request::{make_span, RequestUuid};
use crate::http::routes;
use crate::observability::metrics;
use crate::security::{headers, rate_limit, RateLimiter};
use crate::store::TractStore;

/// Application state injected into handlers.
///
/// Built once at startup; every field is shared, none is mutated per request.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub store: Arc<TractStore>,
}

/// HTTP server for the IGS API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Create a new HTTP server over already-initialized subsystems.
    pub fn new(config: &ApiConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ApiConfig, state: AppState) -> Router {
        let mut router = routes::build(state);

        if config.rate_limit.enabled {
            let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
            router = router.layer(middleware::from_fn_with_state(
                limiter,
                rate_limit::rate_limit_middleware,
            ));
        }

        router = router
            .layer(middleware::from_fn(metrics::track_metrics))
            .layer(DefaultBodyLimit::max(config.security.max_body_size));

        if config.security.enable_headers {
            router = headers::apply(router);
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(SetRequestIdLayer::x_request_id(RequestUuid))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

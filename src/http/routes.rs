//! Route table.
//!
//! # Responsibilities
//! - Declare every endpoint once: path, access level, handler
//! - Compile the table into an axum `Router` at startup
//!
//! # Design Decisions
//! - The table is data; adding an endpoint means adding a row
//! - Bearer routes share one sub-router guarded by `route_layer`, so an
//!   unauthenticated request never reaches a handler, while unknown paths
//!   still answer 404

use axum::{
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};

use crate::http::handlers;
use crate::http::middleware::require_bearer;
use crate::http::server::AppState;

/// Who may call a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Bearer,
}

/// One row of the route table.
pub struct RouteSpec {
    /// Route identifier for logging.
    pub name: &'static str,
    pub path: &'static str,
    pub access: Access,
    pub handler: MethodRouter<AppState>,
}

impl RouteSpec {
    fn new(
        name: &'static str,
        path: &'static str,
        access: Access,
        handler: MethodRouter<AppState>,
    ) -> Self {
        Self {
            name,
            path,
            access,
            handler,
        }
    }
}

/// Every endpoint the API serves.
pub fn route_table() -> Vec<RouteSpec> {
    use Access::*;

    vec![
        RouteSpec::new("health", "/health", Public, get(handlers::health)),
        RouteSpec::new("login", "/token", Public, post(handlers::login)),
        RouteSpec::new("list_tracts", "/tracts/", Bearer, get(handlers::list_tracts)),
        RouteSpec::new("list_tracts", "/tracts", Bearer, get(handlers::list_tracts)),
        RouteSpec::new("get_tract", "/tracts/{census_tract}", Bearer, get(handlers::get_tract)),
        RouteSpec::new("whoami", "/users/me", Bearer, get(handlers::whoami)),
        RouteSpec::new("income_summary", "/summary/income", Bearer, get(handlers::income_summary)),
    ]
}

/// Compile the route table into a router bound to `state`.
pub fn build(state: AppState) -> Router {
    let mut public = Router::new();
    let mut protected = Router::new();

    for route in route_table() {
        tracing::debug!(name = route.name, path = route.path, access = ?route.access, "Registering route");
        match route.access {
            Access::Public => public = public.route(route.path, route.handler),
            Access::Bearer => protected = protected.route(route.path, route.handler),
        }
    }

    let protected =
        protected.route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    public.merge(protected).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn paths_are_unique() {
        let table = route_table();
        let paths: HashSet<_> = table.iter().map(|r| r.path).collect();
        assert_eq!(paths.len(), table.len());
    }

    #[test]
    fn only_health_and_login_are_public() {
        let public: Vec<_> = route_table()
            .into_iter()
            .filter(|r| r.access == Access::Public)
            .map(|r| r.path)
            .collect();
        assert_eq!(public, vec!["/health", "/token"]);
    }
}

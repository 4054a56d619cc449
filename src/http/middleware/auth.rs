//! Bearer token middleware.
//! Guards every protected route before its handler (and the store) runs.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Identity attached to authenticated requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
}

/// Pull the token out of `Authorization: Bearer <token>`.
fn bearer_token(request: &Request<Body>) -> Option<&str> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        tracing::debug!("Missing bearer token");
        metrics::record_auth_failure("missing");
        return ApiError::Unauthorized.into_response();
    };

    match state.auth.validate_token(token) {
        Ok(username) => {
            request.extensions_mut().insert(AuthenticatedUser { username });
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_header(value: &str) -> Request<Body> {
        Request::builder()
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&with_header("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&with_header("bearer abc")), Some("abc"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert_eq!(bearer_token(&with_header("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&with_header("Bearer ")), None);
        assert_eq!(bearer_token(&with_header("Bearer")), None);
        assert_eq!(bearer_token(&Request::new(Body::empty())), None);
    }
}

//! HTTP boundary errors.
//!
//! Every subsystem error is translated here. Auth failures of any kind
//! become one bare 401 so callers cannot tell which check failed; internal
//! failures are logged and answered with a generic 500.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::observability::metrics;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("Census tract {0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("rate limit exceeded")]
    TooManyRequests,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::Expired | AuthError::Malformed => {
                tracing::warn!(reason = err.reason(), "Authentication rejected");
                metrics::record_auth_failure(err.reason());
                ApiError::Unauthorized
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(id),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => {
                let mut response = StatusCode::UNAUTHORIZED.into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::NotFound(_) => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": self.to_string() }))).into_response()
            }
            ApiError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": self.to_string() }))).into_response()
            }
            ApiError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "detail": "Too many requests" })),
            )
                .into_response(),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

//! Request handlers.
//!
//! Protected handlers receive the `AuthenticatedUser` placed by
//! `require_bearer`; they never see an unauthenticated request.

use axum::{
    extract::{Path, Query, State},
    Extension, Form, Json,
};

use crate::http::error::ApiError;
use crate::http::middleware::AuthenticatedUser;
use crate::http::server::AppState;
use crate::http::types::{HealthStatus, ListParams, LoginForm, TokenResponse, WhoAmI};
use crate::store::{CensusTract, IncomeGroupSummary};

/// `POST /token`
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let auth = state.auth.clone();
    let LoginForm { username, password } = form;

    // argon2 verification is CPU-bound
    let token = tokio::task::spawn_blocking(move || auth.issue_token(&username, &password))
        .await
        .map_err(|e| ApiError::Internal(format!("login task failed: {e}")))??;

    tracing::info!(user = %token.subject, "Login succeeded");
    Ok(Json(TokenResponse::bearer(token.access_token)))
}

/// `GET /tracts/`
pub async fn list_tracts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<CensusTract>>, ApiError> {
    let mut tracts = state.store.get_all()?;

    if let Some(min) = params.min_inclusion {
        if !(0.0..=100.0).contains(&min) {
            return Err(ApiError::BadRequest(format!(
                "min_inclusion must be between 0 and 100, got {min}"
            )));
        }
        tracts.retain(|t| t.inclusion_score >= min);
    }

    Ok(Json(tracts))
}

/// `GET /tracts/{census_tract}`
pub async fn get_tract(
    State(state): State<AppState>,
    Path(census_tract): Path<String>,
) -> Result<Json<CensusTract>, ApiError> {
    Ok(Json(state.store.get_by_id(&census_tract)?))
}

/// `GET /users/me`
pub async fn whoami(Extension(user): Extension<AuthenticatedUser>) -> Json<WhoAmI> {
    Json(WhoAmI {
        username: user.username,
    })
}

/// `GET /summary/income`
pub async fn income_summary(
    State(state): State<AppState>,
) -> Result<Json<Vec<IncomeGroupSummary>>, ApiError> {
    Ok(Json(state.store.income_summary()?))
}

/// `GET /health`
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::OnceLock;

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use igs_api::auth::password::hash_password;
use igs_api::config::{ApiConfig, UserConfig};
use igs_api::http::types::TokenResponse;
use igs_api::lifecycle::build_state;
use igs_api::ApiServer;

pub const USERNAME: &str = "analyst";
pub const PASSWORD: &str = "correct-pass";

/// Hashing is the slow part of every fixture; do it once per test binary.
fn password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).unwrap())
}

/// In-memory store seeded with the built-in dataset, one analyst account.
pub fn test_config() -> ApiConfig {
    let mut config = ApiConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.storage.database_path = ":memory:".into();
    config.auth.secret = "integration-test-secret-integration-test".into();
    config.auth.users.push(UserConfig {
        username: USERNAME.into(),
        password_hash: password_hash().to_string(),
    });
    config
}

pub fn test_app(config: ApiConfig) -> Router {
    let state = build_state(&config).unwrap();
    ApiServer::new(&config, state).router()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse { status, headers, body }
}

pub fn login_request(username: &str, password: &str) -> Request<Body> {
    let body = format!("username={username}&password={password}");
    Request::builder()
        .method(Method::POST)
        .uri("/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn login(app: &Router) -> String {
    let response = send(app, login_request(USERNAME, PASSWORD)).await;
    assert_eq!(response.status, StatusCode::OK);
    response.json::<TokenResponse>().access_token
}

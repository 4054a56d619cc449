//! Typed HTTP client for the IGS API.
//!
//! Used by `igs-cli` and the end-to-end tests; it is what a dashboard's data
//! loader would call.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::http::types::{ListParams, LoginForm, TokenResponse, WhoAmI};
use crate::store::{CensusTract, IncomeGroupSummary};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ClientError> {
        let form = LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        };
        let request = self.client.post(format!("{}/token", self.base_url)).form(&form);
        self.send(request).await
    }

    pub async fn list_tracts(
        &self,
        token: &str,
        min_inclusion: Option<f64>,
    ) -> Result<Vec<CensusTract>, ClientError> {
        let request = self
            .client
            .get(format!("{}/tracts/", self.base_url))
            .bearer_auth(token)
            .query(&ListParams { min_inclusion });
        self.send(request).await
    }

    pub async fn get_tract(&self, token: &str, census_tract: &str) -> Result<CensusTract, ClientError> {
        let request = self
            .client
            .get(format!("{}/tracts/{}", self.base_url, census_tract))
            .bearer_auth(token);
        self.send(request).await
    }

    pub async fn whoami(&self, token: &str) -> Result<WhoAmI, ClientError> {
        let request = self
            .client
            .get(format!("{}/users/me", self.base_url))
            .bearer_auth(token);
        self.send(request).await
    }

    pub async fn income_summary(&self, token: &str) -> Result<Vec<IncomeGroupSummary>, ClientError> {
        let request = self
            .client
            .get(format!("{}/summary/income", self.base_url))
            .bearer_auth(token);
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(response.text().await?)),
            status => Err(ClientError::Status {
                status: status.as_u16(),
                body: response.text().await?,
            }),
        }
    }
}

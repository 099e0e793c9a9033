//! The bot's client for the backend API.

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::types::{HealthResponse, ModelsResponse, QueryRequest, QueryResponse};

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("Could not reach the API: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a prompt and returns the model's answer.
    pub async fn query(&self, request: &QueryRequest) -> Result<String, ApiClientError> {
        let response = self
            .http
            .post(format!("{}/query", self.base_url))
            .json(request)
            .send()
            .await?;
        let body: QueryResponse = decode(response).await?;
        Ok(body.response)
    }

    pub async fn health(&self, verbosity: i64) -> Result<HealthResponse, ApiClientError> {
        let response = self
            .http
            .get(format!("{}/health/{}", self.base_url, verbosity))
            .send()
            .await?;
        decode(response).await
    }

    /// Models installed on the API's local inference server.
    pub async fn models(&self) -> Result<Vec<String>, ApiClientError> {
        let response = self
            .http
            .get(format!("{}/agent/models", self.base_url))
            .send()
            .await?;
        let body: ModelsResponse = decode(response).await?;
        Ok(body.models)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(text);
    Err(ApiClientError::Status {
        status: status.as_u16(),
        message,
    })
}

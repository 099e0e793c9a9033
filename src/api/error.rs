use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::llm::ProviderError;

/// Handler error rendered as `{"error": "..."}` with a matching status.
#[derive(Debug)]
pub enum ApiError {
    /// 400: the caller asked for something that does not exist.
    BadRequest(String),
    /// 502: the LLM backend failed or could not be reached.
    BadGateway(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::BadGateway(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
        };
        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        if err.is_client_error() {
            Self::BadRequest(err.to_string())
        } else {
            Self::BadGateway(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_provider_errors_map_to_status() {
        let (status, body) =
            render(ProviderError::UnknownProvider("gemini".to_string()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unknown LLM provider: gemini");

        let (status, body) = render(ProviderError::EmptyResponse("ollama").into()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("ollama"));
    }
}

use axum::extract::{Path, State};
use axum::Json;
use tracing::info;

use super::error::ApiError;
use super::types::{
    Health, HealthResponse, MessageResponse, ModelsResponse, QueryRequest, QueryResponse,
};
use super::AppState;
use crate::discord_text::preview;
use crate::llm::{ollama, ProviderOptions};

const PLACEHOLDER: &str = "These are not the droids you are looking for";

pub async fn root() -> Json<QueryResponse> {
    Json(QueryResponse {
        response: "Go away".to_string(),
    })
}

/// `n` is a verbosity level: 1 is a bare liveness check, 2 adds the
/// registered providers, 3 also checks the local inference server.
pub async fn health(State(state): State<AppState>, Path(n): Path<i64>) -> Json<HealthResponse> {
    if n <= 0 {
        return Json(HealthResponse {
            health: Health::Unhealthy,
            providers: None,
        });
    }

    let providers = (n >= 2).then(|| state.registry.names());
    let mut health = Health::Healthy;
    if n >= 3 {
        let base_url = &state.registry.settings().ollama_base_url;
        if let Err(e) = ollama::list_models(&state.http, base_url).await {
            info!("Health probe of {} failed: {}", base_url, e);
            health = Health::Unhealthy;
        }
    }

    Json(HealthResponse { health, providers })
}

pub async fn query_get() -> Json<QueryResponse> {
    Json(QueryResponse {
        response: PLACEHOLDER.to_string(),
    })
}

pub async fn query_post(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    info!(
        llm = %request.llm,
        model = %request.model,
        "Query: {}",
        preview(&request.content, 80)
    );

    let options = ProviderOptions {
        show_thoughts: request.show_thoughts,
        ..Default::default()
    };
    let response = state
        .registry
        .query(&request.llm, &request.model, &request.content, &options)
        .await?;

    Ok(Json(QueryResponse { response }))
}

pub async fn agent_get() -> Json<QueryResponse> {
    Json(QueryResponse {
        response: PLACEHOLDER.to_string(),
    })
}

pub async fn agent_models(State(state): State<AppState>) -> Result<Json<ModelsResponse>, ApiError> {
    let models =
        ollama::list_models(&state.http, &state.registry.settings().ollama_base_url).await?;
    Ok(Json(ModelsResponse { models }))
}

pub async fn reset_get() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Entry for reset check endpoint".to_string(),
    })
}

pub async fn reset_post(Path(data): Path<String>) -> Json<MessageResponse> {
    Json(MessageResponse { message: data })
}

//! Backend HTTP API: relays prompts from the bot to an LLM provider.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::config::ApiConfig;
use crate::llm::ProviderRegistry;

pub mod error;
pub mod routes;
pub mod types;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ProviderRegistry>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            http: reqwest::Client::new(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/health/{n}", get(routes::health))
        .route("/query", get(routes::query_get).post(routes::query_post))
        .route("/agent", get(routes::agent_get))
        .route("/agent/models", get(routes::agent_models))
        .route("/reset", get(routes::reset_get))
        .route("/reset/{data}", post(routes::reset_post))
        .with_state(state)
}

/// Binds `config.bind_addr` and serves until Ctrl-C.
pub async fn serve(config: ApiConfig) -> anyhow::Result<()> {
    let state = AppState::new(ProviderRegistry::with_defaults(config.providers.clone()));
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down API server");
        })
        .await?;
    Ok(())
}

pub mod api;
pub mod api_client;
pub mod commands;
pub mod config;
pub mod db;
pub mod discord_text;
pub mod events;
pub mod llm;
pub mod logging;
pub mod maintenance;

use std::sync::Arc;

/// Provider and model used by the `query` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub llm: String,
    pub model: String,
}

/// Custom data passed to all commands
pub struct Data {
    pub config: config::Config,
    pub api: api_client::ApiClient,
    pub db: db::Database,
    pub logs: Arc<logging::BatchedLogHandler>,
    /// Known provider names, used to validate `model` switches
    pub providers: llm::ProviderRegistry,
    pub selection: tokio::sync::RwLock<ModelSelection>,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

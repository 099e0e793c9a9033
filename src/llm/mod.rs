//! LLM provider dispatch.
//!
//! Each backend implements [`LlmProvider`]. The [`ProviderRegistry`] maps a
//! provider name to a constructor, so a new backend is one `register` call.

use async_trait::async_trait;
use thiserror::Error;

pub mod anthropic;
pub mod bedrock;
pub mod client;
pub mod ollama;
pub mod registry;
pub mod thoughts;

pub use anthropic::AnthropicProvider;
pub use bedrock::BedrockProvider;
pub use client::OpenAiProvider;
pub use ollama::OllamaProvider;
pub use registry::{ProviderConstructor, ProviderRegistry};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Unknown LLM provider: {0}")]
    UnknownProvider(String),

    #[error("{provider} needs {variable} to be set")]
    MissingCredential {
        provider: &'static str,
        variable: &'static str,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI request failed: {0}")]
    OpenAi(#[from] async_openai::error::OpenAIError),

    #[error("{provider} returned HTTP {status}: {body}")]
    Upstream {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} returned an empty response")]
    EmptyResponse(&'static str),
}

impl ProviderError {
    /// True when the caller picked a provider that does not exist, as opposed
    /// to the provider failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ProviderError::UnknownProvider(_))
    }
}

/// Per-request knobs passed to provider constructors.
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    /// Keep `<think>` reasoning in the answer as a quoted section.
    pub show_thoughts: bool,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    /// Sends one user prompt and returns the raw completion text.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// One completion: no retry, no streaming. Reasoning blocks are stripped or
/// rendered according to `options.show_thoughts`.
pub async fn query(
    provider: &dyn LlmProvider,
    prompt: &str,
    options: &ProviderOptions,
) -> Result<String, ProviderError> {
    tracing::debug!(
        "Querying {} ({}) with {} chars",
        provider.name(),
        provider.model(),
        prompt.chars().count()
    );
    let raw = provider.complete(prompt).await?;
    Ok(thoughts::render(&raw, options.show_thoughts))
}

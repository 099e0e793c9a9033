use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{thoughts, LlmProvider, ProviderError, ProviderOptions};
use crate::config::ProviderSettings;

const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Anthropic Messages API.
pub struct AnthropicProvider {
    http: reqwest::Client,
    api_key: Option<String>,
    url: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [UserMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
    },
    #[serde(other)]
    Other,
}

impl AnthropicProvider {
    pub fn new(settings: &ProviderSettings, model: &str, options: &ProviderOptions) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: settings.anthropic_api_key.clone(),
            url: format!(
                "{}/v1/messages",
                settings.anthropic_base_url.trim_end_matches('/')
            ),
            model: model.to_string(),
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: options.temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential {
                provider: "anthropic",
                variable: "ANTHROPIC_API_KEY",
            })?;

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(&self.url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Upstream {
                provider: "anthropic",
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        let mut thinking = Vec::new();
        let mut text = String::new();
        for block in parsed.content {
            match block {
                ContentBlock::Text { text: part } => text.push_str(&part),
                ContentBlock::Thinking { thinking: part } => thinking.push(part),
                ContentBlock::Other => {}
            }
        }

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse("anthropic"));
        }
        let thinking = thinking.join("\n");
        Ok(thoughts::wrap(Some(&thinking), &text))
    }
}

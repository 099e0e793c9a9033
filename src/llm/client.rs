use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

use super::{LlmProvider, ProviderError, ProviderOptions};
use crate::config::ProviderSettings;

/// OpenAI chat completions (or any API speaking the same protocol).
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    has_key: bool,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl OpenAiProvider {
    pub fn new(settings: &ProviderSettings, model: &str, options: &ProviderOptions) -> Self {
        let mut config = OpenAIConfig::new();
        if let Some(base) = &settings.openai_base_url {
            config = config.with_api_base(base.trim_end_matches('/'));
        }
        if let Some(key) = &settings.openai_api_key {
            config = config.with_api_key(key);
        }

        Self {
            client: Client::with_config(config),
            has_key: settings.openai_api_key.is_some(),
            model: model.to_string(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        if !self.has_key {
            return Err(ProviderError::MissingCredential {
                provider: "openai",
                variable: "OPENAI_API_KEY",
            });
        }

        let messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into()];

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);
        if let Some(temperature) = self.temperature {
            args.temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            args.max_completion_tokens(max_tokens);
        }
        let request = args.build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse("openai"))
    }
}

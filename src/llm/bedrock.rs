use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{LlmProvider, ProviderError, ProviderOptions};
use crate::config::ProviderSettings;

/// Amazon Bedrock Converse API, authenticated with a Bedrock API key.
pub struct BedrockProvider {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ConverseResponse {
    output: ConverseOutput,
}

#[derive(Deserialize)]
struct ConverseOutput {
    message: Option<ConverseMessage>,
}

#[derive(Deserialize)]
struct ConverseMessage {
    #[serde(default)]
    content: Vec<ConverseContent>,
}

#[derive(Deserialize)]
struct ConverseContent {
    text: Option<String>,
}

impl BedrockProvider {
    pub fn new(settings: &ProviderSettings, model: &str, options: &ProviderOptions) -> Self {
        let base_url = settings
            .bedrock_base_url
            .clone()
            .unwrap_or_else(|| {
                format!("https://bedrock-runtime.{}.amazonaws.com", settings.aws_region)
            });
        Self {
            http: reqwest::Client::new(),
            api_key: settings.bedrock_api_key.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        }
    }

    fn converse_url(&self) -> String {
        format!(
            "{}/model/{}/converse",
            self.base_url,
            urlencoding::encode(&self.model)
        )
    }
}

#[async_trait]
impl LlmProvider for BedrockProvider {
    fn name(&self) -> &'static str {
        "bedrock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential {
                provider: "bedrock",
                variable: "AWS_BEARER_TOKEN_BEDROCK",
            })?;

        let mut inference = serde_json::Map::new();
        if let Some(max_tokens) = self.max_tokens {
            inference.insert("maxTokens".to_string(), json!(max_tokens));
        }
        if let Some(temperature) = self.temperature {
            inference.insert("temperature".to_string(), json!(temperature));
        }

        let mut body = json!({
            "messages": [{"role": "user", "content": [{"text": prompt}]}],
        });
        if !inference.is_empty() {
            body["inferenceConfig"] = serde_json::Value::Object(inference);
        }

        let response = self
            .http
            .post(self.converse_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Upstream {
                provider: "bedrock",
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: ConverseResponse = response.json().await?;
        let text: String = parsed
            .output
            .message
            .map(|m| m.content.into_iter().filter_map(|c| c.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse("bedrock"));
        }
        Ok(text)
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{thoughts, LlmProvider, ProviderError, ProviderOptions};
use crate::config::ProviderSettings;

const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Local inference through an Ollama server.
pub struct OllamaProvider {
    http: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    thinking: Option<String>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaProvider {
    pub fn new(settings: &ProviderSettings, model: &str, options: &ProviderOptions) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: settings.ollama_base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: options.max_tokens,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Upstream {
                provider: "ollama",
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let message = parsed
            .message
            .filter(|m| !m.content.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse("ollama"))?;
        Ok(thoughts::wrap(message.thinking.as_deref(), &message.content))
    }
}

/// Names of the models installed on the Ollama server at `base_url`.
pub async fn list_models(
    http: &reqwest::Client,
    base_url: &str,
) -> Result<Vec<String>, ProviderError> {
    let response = http
        .get(format!("{}/api/tags", base_url.trim_end_matches('/')))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Upstream {
            provider: "ollama",
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }

    let tags: TagsResponse = response.json().await?;
    Ok(tags.models.into_iter().map(|m| m.name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base: &str) -> OllamaProvider {
        let settings = ProviderSettings {
            ollama_base_url: format!("{}/", base),
            ..Default::default()
        };
        OllamaProvider::new(&settings, "deepseek-r1:8b", &ProviderOptions::default())
    }

    #[tokio::test]
    async fn test_complete_sends_non_streaming_chat() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "deepseek-r1:8b",
                "stream": false,
                "options": {"temperature": 0.7},
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "deepseek-r1:8b",
                "message": {"role": "assistant", "content": "Hello!", "thinking": "greet"},
                "done": true
            })))
            .mount(&server)
            .await;

        let text = provider(&server.uri()).complete("hi").await.unwrap();
        assert_eq!(text, "<think>greet</think>Hello!");
    }

    #[tokio::test]
    async fn test_empty_message_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": {"role": "assistant", "content": ""}})),
            )
            .mount(&server)
            .await;

        let err = provider(&server.uri()).complete("hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse("ollama")));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let err = provider("http://127.0.0.1:1").complete("hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::Http(_)));
    }

    #[tokio::test]
    async fn test_list_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{"name": "llama3:8b"}, {"name": "deepseek-r1:8b"}]
            })))
            .mount(&server)
            .await;

        let models = list_models(&reqwest::Client::new(), &server.uri())
            .await
            .unwrap();
        assert_eq!(models, vec!["llama3:8b", "deepseek-r1:8b"]);
    }
}

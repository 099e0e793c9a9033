use serde::{Deserialize, Serialize};

/// Body of `POST /query`. Every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryRequest {
    pub content: String,
    pub llm: String,
    pub model: String,
    pub show_thoughts: bool,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            content: "Waduhek?".to_string(),
            llm: "ollama".to_string(),
            model: "deepseek-r1:8b".to_string(),
            show_thoughts: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub response: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub health: Health,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_defaults_fill_missing_fields() {
        let request: QueryRequest = serde_json::from_str(r#"{"content": "hi"}"#).unwrap();
        assert_eq!(request.content, "hi");
        assert_eq!(request.llm, "ollama");
        assert_eq!(request.model, "deepseek-r1:8b");
        assert!(!request.show_thoughts);

        let empty: QueryRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, QueryRequest::default());
    }

    #[test]
    fn test_health_serializes_as_plain_word() {
        let body = serde_json::to_value(HealthResponse {
            health: Health::Unhealthy,
            providers: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"health": "Unhealthy"}));
    }
}

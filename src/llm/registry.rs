use std::collections::HashMap;

use super::{
    query, AnthropicProvider, BedrockProvider, LlmProvider, OllamaProvider, OpenAiProvider,
    ProviderError, ProviderOptions,
};
use crate::config::ProviderSettings;

/// Builds a provider client for one model.
pub type ProviderConstructor =
    fn(&ProviderSettings, &str, &ProviderOptions) -> Box<dyn LlmProvider>;

/// Name → constructor table for LLM providers.
#[derive(Clone)]
pub struct ProviderRegistry {
    settings: ProviderSettings,
    constructors: HashMap<String, ProviderConstructor>,
}

impl ProviderRegistry {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            settings,
            constructors: HashMap::new(),
        }
    }

    /// Registry with the built-in openai, anthropic, bedrock and ollama providers.
    pub fn with_defaults(settings: ProviderSettings) -> Self {
        let mut registry = Self::new(settings);
        registry.register("openai", openai);
        registry.register("anthropic", anthropic);
        registry.register("bedrock", bedrock);
        registry.register("ollama", ollama);
        registry
    }

    pub fn register(&mut self, name: &str, constructor: ProviderConstructor) {
        self.constructors.insert(normalize(name), constructor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(&normalize(name))
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Builds a client for `name`. Unknown names fail before anything is
    /// constructed. Credentials are checked when the client is used.
    pub fn resolve(
        &self,
        name: &str,
        model: &str,
        options: &ProviderOptions,
    ) -> Result<Box<dyn LlmProvider>, ProviderError> {
        let constructor = self
            .constructors
            .get(&normalize(name))
            .ok_or_else(|| ProviderError::UnknownProvider(name.trim().to_string()))?;
        Ok(constructor(&self.settings, model, options))
    }

    /// Resolves `name` and runs a single completion.
    pub async fn query(
        &self,
        name: &str,
        model: &str,
        prompt: &str,
        options: &ProviderOptions,
    ) -> Result<String, ProviderError> {
        let provider = self.resolve(name, model, options)?;
        query(provider.as_ref(), prompt, options).await
    }
}

fn openai(s: &ProviderSettings, model: &str, o: &ProviderOptions) -> Box<dyn LlmProvider> {
    Box::new(OpenAiProvider::new(s, model, o))
}

fn anthropic(s: &ProviderSettings, model: &str, o: &ProviderOptions) -> Box<dyn LlmProvider> {
    Box::new(AnthropicProvider::new(s, model, o))
}

fn bedrock(s: &ProviderSettings, model: &str, o: &ProviderOptions) -> Box<dyn LlmProvider> {
    Box::new(BedrockProvider::new(s, model, o))
}

fn ollama(s: &ProviderSettings, model: &str, o: &ProviderOptions) -> Box<dyn LlmProvider> {
    Box::new(OllamaProvider::new(s, model, o))
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

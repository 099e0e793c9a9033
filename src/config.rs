use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Credentials and endpoints for every LLM provider.
#[derive(Clone, Default)]
pub struct ProviderSettings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub bedrock_api_key: Option<String>,
    pub aws_region: String,
    pub bedrock_base_url: Option<String>,
    pub ollama_base_url: String,
}

impl ProviderSettings {
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::build()
    }

    fn build() -> Self {
        ProviderSettings {
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            openai_base_url: env::var("OPENAI_BASE_URL").ok(),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok(),
            anthropic_base_url: env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
            bedrock_api_key: env::var("AWS_BEARER_TOKEN_BEDROCK").ok(),
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            bedrock_base_url: env::var("BEDROCK_BASE_URL").ok(),
            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
        }
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field(
                "bedrock_api_key",
                &self.bedrock_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("aws_region", &self.aws_region)
            .field("bedrock_base_url", &self.bedrock_base_url)
            .field("ollama_base_url", &self.ollama_base_url)
            .finish()
    }
}

/// Bot configuration.
#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub guild_id: Option<u64>,
    pub home_channel_id: Option<u64>,
    pub owner_id: Option<u64>,
    pub command_prefix: String,
    pub api_url: String,
    pub database_url: String,
    pub database_reset_on_boot: bool,

    // Log pipeline
    pub log_batch_size: usize,
    pub log_flush_interval: Duration,
    pub log_retention_days: u64,

    // Initial model selection
    pub default_llm: String,
    pub default_model: String,

    pub providers: ProviderSettings,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::build()
    }

    fn build() -> anyhow::Result<Self> {
        Ok(Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN must be set"))?,
            guild_id: env::var("GUILD_ID").ok().and_then(|id| id.parse().ok()),
            home_channel_id: env::var("HOME_CHANNEL_ID")
                .ok()
                .and_then(|id| id.parse().ok()),
            owner_id: env::var("OWNER_ID").ok().and_then(|id| id.parse().ok()),
            command_prefix: env::var("COMMAND_PREFIX").unwrap_or_else(|_| "/".to_string()),
            api_url: env::var("API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "data/logs.db".to_string()),
            database_reset_on_boot: env::var("DATABASE_RESET_ON_BOOT")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            log_batch_size: env::var("LOG_BATCH_SIZE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap_or(50),
            log_flush_interval: parse_flush_interval(env::var("LOG_FLUSH_INTERVAL").ok())?,
            log_retention_days: env::var("LOG_RETENTION_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            default_llm: env::var("DEFAULT_LLM").unwrap_or_else(|_| "ollama".to_string()),
            default_model: env::var("DEFAULT_MODEL")
                .unwrap_or_else(|_| "deepseek-r1:7b".to_string()),
            providers: ProviderSettings::build(),
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"[REDACTED]")
            .field("guild_id", &self.guild_id)
            .field("home_channel_id", &self.home_channel_id)
            .field("owner_id", &self.owner_id)
            .field("command_prefix", &self.command_prefix)
            .field("api_url", &self.api_url)
            .field("database_url", &self.database_url)
            .field("database_reset_on_boot", &self.database_reset_on_boot)
            .field("log_batch_size", &self.log_batch_size)
            .field("log_flush_interval", &self.log_flush_interval)
            .field("log_retention_days", &self.log_retention_days)
            .field("default_llm", &self.default_llm)
            .field("default_model", &self.default_model)
            .field("providers", &self.providers)
            .finish()
    }
}

/// Backend API configuration. Needs no Discord credentials.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub providers: ProviderSettings,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::build()
    }

    fn build() -> Self {
        ApiConfig {
            bind_addr: env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            providers: ProviderSettings::build(),
        }
    }
}

/// Accepts humantime strings ("5s", "1m 30s") or a bare number of seconds.
fn parse_flush_interval(raw: Option<String>) -> anyhow::Result<Duration> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(5));
    };
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(raw)
        .map_err(|e| anyhow::anyhow!("LOG_FLUSH_INTERVAL is not a valid duration: {}", e))
}

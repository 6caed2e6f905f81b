use serde::Deserialize;

use crate::domain::circuit::CircuitBreakerConfig;
use crate::domain::gateway::GatewayConfig;
use crate::domain::routing::RoutingConfig;
use crate::domain::semantic_cache::SemanticCacheConfig;
use crate::domain::usage::ModelPricing;
use crate::infrastructure::llm::LlmProviderConfig;
use crate::infrastructure::observability::MetricsConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub circuit: CircuitBreakerConfig,
    #[serde(default)]
    pub cache: SemanticCacheConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub providers: Vec<LlmProviderConfig>,
    #[serde(default)]
    pub routing: Option<RoutingConfig>,
    /// Overrides and additions to the built-in price list
    #[serde(default)]
    pub pricing: Vec<ModelPricing>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Embedding service used by the semantic cache
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_embedding_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_embedding_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_embedding_timeout_ms() -> u64 {
    10_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_env: default_embedding_key_env(),
            timeout_ms: default_embedding_timeout_ms(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::ProviderKind;

    const SAMPLE: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 9090

        [logging]
        level = "debug"
        format = "json"

        [gateway]
        default_deadline_ms = 15000

        [circuit]
        cooldown_secs = 10

        [cache]
        similarity_threshold = 0.95

        [[providers]]
        id = "openai"
        kind = "openai"
        api_key_env = "OPENAI_API_KEY"

        [[providers]]
        id = "anthropic"
        kind = "anthropic"
        api_key_env = "ANTHROPIC_API_KEY"

        [[routing.rules]]
        name = "code"
        predicate = { type = "task_class", equals = "code_generation" }
        target = { provider = "anthropic", model = "claude-3-5-sonnet-20241022" }

        [[routing.rules]]
        predicate = { type = "always" }
        target = { provider = "openai", model = "gpt-4o-mini" }

        [[routing.fallback_chain]]
        provider = "anthropic"
        model = "claude-3-5-haiku-20241022"

        [[pricing]]
        provider = "openai"
        model = "gpt-4o-mini"
        input_per_1k_usd = 0.00015
        output_per_1k_usd = 0.0006
    "#;

    fn parse(toml: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_full_config_parses() {
        let config = parse(SAMPLE);

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.gateway.default_deadline_ms, 15000);
        assert_eq!(config.circuit.cooldown_secs, 10);
        assert_eq!(config.circuit.window_size, 20);
        assert!((config.cache.similarity_threshold - 0.95).abs() < f32::EPSILON);
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].kind, ProviderKind::OpenAi);
        assert_eq!(config.pricing.len(), 1);

        let routing = config.routing.unwrap();
        routing.validate().unwrap();
        assert_eq!(routing.rules.rules().len(), 2);
        assert_eq!(routing.fallback_chain.targets().len(), 1);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert!(config.metrics.enabled);
        assert_eq!(config.gateway.default_deadline_ms, 30000);
        assert!(config.routing.is_none());
        assert_eq!(config.embedding.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_shipped_default_config_is_valid() {
        let config = parse(include_str!("../../config/default.toml"));

        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.gateway.retry.max_retries, 0);
        assert_eq!(config.circuit.minimum_samples, 1);

        let routing = config.routing.unwrap();
        routing.validate().unwrap();
        assert_eq!(routing.rules.default_rule().target.provider, "openai");
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::http_client::HttpClient;
use super::{AnthropicProvider, OpenAiProvider};
use crate::domain::{DomainError, LlmProvider};

/// Upstream API flavour of a configured provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(alias = "open_ai")]
    OpenAi,
    Anthropic,
}

/// One configured upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Id routing targets refer to
    pub id: String,
    pub kind: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

/// Factory for creating LLM providers
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create a provider from configuration and an API key
    pub fn create(
        config: &LlmProviderConfig,
        api_key: &str,
        client: HttpClient,
    ) -> Arc<dyn LlmProvider> {
        match config.kind {
            ProviderKind::OpenAi => {
                let provider = match &config.base_url {
                    Some(url) => OpenAiProvider::with_base_url(client, api_key, url),
                    None => OpenAiProvider::new(client, api_key),
                };
                Arc::new(provider.with_id(&config.id))
            }
            ProviderKind::Anthropic => {
                let provider = match &config.base_url {
                    Some(url) => AnthropicProvider::with_base_url(client, api_key, url),
                    None => AnthropicProvider::new(client, api_key),
                };
                Arc::new(provider.with_id(&config.id))
            }
        }
    }

    /// Build a registry from configuration, reading keys through `lookup_key`.
    ///
    /// A provider whose key is missing is still registered so that calls to it
    /// classify as auth failures instead of disappearing from routing.
    pub fn build_registry(
        configs: &[LlmProviderConfig],
        lookup_key: impl Fn(&str) -> Option<String>,
    ) -> Result<ProviderRegistry, DomainError> {
        let client = HttpClient::new();
        let mut registry = ProviderRegistry::new();

        for config in configs {
            let api_key = lookup_key(&config.api_key_env).unwrap_or_else(|| {
                warn!(
                    provider = %config.id,
                    env = %config.api_key_env,
                    "API key not set; calls to this provider will fail authentication"
                );
                String::new()
            });

            registry.register(Self::create(config, &api_key, client.clone()))?;
        }

        Ok(registry)
    }
}

/// Provider adapters keyed by provider id
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) -> Result<(), DomainError> {
        let id = provider.provider_id().to_string();

        if self.providers.contains_key(&id) {
            return Err(DomainError::configuration(format!(
                "provider '{}' registered twice",
                id
            )));
        }

        self.providers.insert(id, provider);
        Ok(())
    }

    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Result<Self, DomainError> {
        self.register(provider)?;
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    /// Registered ids in sorted order
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

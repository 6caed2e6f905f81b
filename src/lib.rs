//! LLM Gateway routing layer
//!
//! Routes model invocations across upstream providers with:
//! - Rule-based target selection and fallback chains
//! - Per-provider circuit breaking
//! - Semantic response caching keyed by prompt embeddings
//! - Deadline-aware orchestration with per-candidate diagnostics

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api::state::AppState;
use domain::usage::PricingTable;
use infrastructure::circuit::HealthTracker;
use infrastructure::embedding::{MemoizedEmbeddingProvider, OpenAiEmbeddingProvider};
use infrastructure::llm::{HttpClient, LlmProviderFactory};
use infrastructure::semantic_cache::InMemorySemanticCache;
use infrastructure::services::{GatewayService, SemanticCacheService};
use tracing::info;

/// Create the application state from configuration found on disk and in the environment
pub async fn create_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::load().context("failed to load configuration")?;
    create_app_state_with_config(&config).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let routing = config
        .routing
        .clone()
        .context("no [routing] section configured")?;

    let registry =
        LlmProviderFactory::build_registry(&config.providers, |env| std::env::var(env).ok())?;
    info!(providers = ?registry.ids(), "Provider adapters registered");

    let health = Arc::new(HealthTracker::new(config.circuit.clone()));

    let mut pricing = PricingTable::with_defaults();
    for entry in &config.pricing {
        pricing.insert(entry.clone());
    }

    let mut gateway = GatewayService::new(routing, registry, health)?
        .with_pricing(pricing)
        .with_config(config.gateway.clone());

    if config.cache.enabled {
        gateway = gateway.with_cache(Arc::new(create_cache_service(config)));
        info!(
            threshold = config.cache.similarity_threshold,
            max_entries = config.cache.max_entries,
            "Semantic cache enabled"
        );
    }

    Ok(AppState::new(Arc::new(gateway)))
}

fn create_cache_service(config: &AppConfig) -> SemanticCacheService {
    let embedding = &config.embedding;
    let api_key = std::env::var(&embedding.api_key_env).unwrap_or_default();
    let model = config.cache.embedding_model.clone();

    let provider = match &embedding.base_url {
        Some(url) => OpenAiEmbeddingProvider::with_base_url(HttpClient::new(), api_key, model, url),
        None => OpenAiEmbeddingProvider::new(HttpClient::new(), api_key, model),
    }
    .with_timeout(Duration::from_millis(embedding.timeout_ms));

    let provider = MemoizedEmbeddingProvider::new(provider, config.cache.embedding_memo_capacity);

    SemanticCacheService::new(
        Arc::new(InMemorySemanticCache::new(config.cache.max_entries)),
        Arc::new(provider),
        config.cache.clone(),
    )
}

//! Semantic response caching service
//!
//! Wraps the vector store and the embedding provider. Every failure in here is
//! logged and treated as a miss; callers never see a cache error.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::DomainError;
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::llm::LlmRequest;
use crate::domain::semantic_cache::{
    CacheEntry, CacheHit, CacheKey, CachedResponse, SemanticCache, SemanticCacheConfig,
    SemanticCacheStats,
};
use crate::infrastructure::observability::{CacheLookupResult, record_cache_lookup};

/// Semantic cache service that uses embeddings for similarity matching
#[derive(Debug)]
pub struct SemanticCacheService {
    cache: Arc<dyn SemanticCache>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    config: SemanticCacheConfig,
}

impl SemanticCacheService {
    pub fn new(
        cache: Arc<dyn SemanticCache>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        config: SemanticCacheConfig,
    ) -> Self {
        Self {
            cache,
            embedding_provider,
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &SemanticCacheConfig {
        &self.config
    }

    fn key(&self, request: &LlmRequest) -> Option<CacheKey> {
        let key = CacheKey::for_request(request, self.config.partition_by_model);
        (!key.text.trim().is_empty()).then_some(key)
    }

    /// Find a cached response for a semantically similar earlier request
    pub async fn lookup(&self, request: &LlmRequest) -> Option<CacheHit> {
        if !self.config.enabled {
            return None;
        }

        let key = self.key(request)?;

        match self.try_lookup(&key).await {
            Ok(Some(hit)) => {
                debug!(
                    partition = %key.partition,
                    similarity = hit.similarity,
                    "Semantic cache hit"
                );
                record_cache_lookup(CacheLookupResult::Hit);
                Some(hit)
            }
            Ok(None) => {
                debug!(partition = %key.partition, "Semantic cache miss");
                record_cache_lookup(CacheLookupResult::Miss);
                None
            }
            Err(e) => {
                warn!(partition = %key.partition, error = %e, "Semantic cache lookup failed, treating as miss");
                record_cache_lookup(CacheLookupResult::Error);
                None
            }
        }
    }

    async fn try_lookup(&self, key: &CacheKey) -> Result<Option<CacheHit>, DomainError> {
        let embedding = self.embedding_provider.embed(&key.text).await?;

        self.cache
            .find_similar(&key.partition, &embedding, self.config.similarity_threshold)
            .await
    }

    /// Cache the response for `request`. Returns whether a new entry was written.
    pub async fn store(&self, request: &LlmRequest, response: CachedResponse) -> bool {
        if !self.config.enabled {
            return false;
        }

        let Some(key) = self.key(request) else {
            return false;
        };

        match self.try_store(key, response).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Failed to store response in semantic cache");
                false
            }
        }
    }

    async fn try_store(&self, key: CacheKey, response: CachedResponse) -> Result<bool, DomainError> {
        if self.cache.contains_digest(&key.partition, &key.digest).await? {
            return Ok(false);
        }

        let embedding = self.embedding_provider.embed(&key.text).await?;
        let entry = CacheEntry::new(key, embedding, response, self.config.ttl());

        self.cache.store(entry).await
    }

    pub async fn stats(&self) -> Result<SemanticCacheStats, DomainError> {
        self.cache.stats().await
    }

    pub async fn cleanup_expired(&self) -> Result<usize, DomainError> {
        self.cache.cleanup_expired().await
    }

    pub async fn clear(&self) -> Result<usize, DomainError> {
        self.cache.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::llm::Usage;
    use crate::infrastructure::semantic_cache::InMemorySemanticCache;

    fn response(content: &str) -> CachedResponse {
        CachedResponse {
            content: content.to_string(),
            usage: Usage::new(12, 8),
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
        }
    }

    fn service(embedder: Arc<MockEmbeddingProvider>) -> SemanticCacheService {
        SemanticCacheService::new(
            Arc::new(InMemorySemanticCache::new(100)),
            embedder,
            SemanticCacheConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_store_then_lookup_similar() {
        let embedder = Arc::new(
            MockEmbeddingProvider::new(3)
                .with_vector("capital of France", vec![1.0, 0.0, 0.0])
                .with_vector("France's capital", vec![0.98, 0.05, 0.0]),
        );
        let service = service(embedder);

        let original = LlmRequest::builder().user("What is the capital of France?").build();
        assert!(service.store(&original, response("Paris")).await);

        let similar = LlmRequest::builder().user("Tell me France's capital").build();
        let hit = service.lookup(&similar).await.unwrap();

        assert_eq!(hit.entry.response.content, "Paris");
        assert!(hit.similarity >= 0.92);
    }

    #[tokio::test]
    async fn test_dissimilar_request_misses() {
        let embedder = Arc::new(
            MockEmbeddingProvider::new(3)
                .with_vector("capital of France", vec![1.0, 0.0, 0.0])
                .with_vector("sort a vector", vec![0.0, 1.0, 0.0]),
        );
        let service = service(embedder);

        let original = LlmRequest::builder().user("What is the capital of France?").build();
        service.store(&original, response("Paris")).await;

        let other = LlmRequest::builder().user("How do I sort a vector?").build();
        assert!(service.lookup(&other).await.is_none());
    }

    #[tokio::test]
    async fn test_tenants_do_not_share_entries() {
        let embedder = Arc::new(MockEmbeddingProvider::new(16));
        let service = service(embedder);

        let tenant_a = LlmRequest::builder().user("hello").tenant("a").build();
        let tenant_b = LlmRequest::builder().user("hello").tenant("b").build();

        service.store(&tenant_a, response("hi a")).await;

        assert!(service.lookup(&tenant_a).await.is_some());
        assert!(service.lookup(&tenant_b).await.is_none());
    }

    #[tokio::test]
    async fn test_embedding_failure_is_a_miss() {
        let embedder = Arc::new(MockEmbeddingProvider::new(8));
        let service = service(Arc::clone(&embedder));

        let request = LlmRequest::builder().user("hello").build();
        service.store(&request, response("hi")).await;

        embedder.set_failing(true);

        assert!(service.lookup(&request).await.is_none());
        assert!(!service.store(&request, response("hi again")).await);
    }

    #[tokio::test]
    async fn test_store_skips_embedding_for_known_digest() {
        let embedder = Arc::new(MockEmbeddingProvider::new(8));
        let service = service(Arc::clone(&embedder));
        let request = LlmRequest::builder().user("hello").build();

        assert!(service.store(&request, response("first")).await);
        assert!(!service.store(&request, response("second")).await);

        assert_eq!(embedder.call_count(), 1);
        assert_eq!(service.stats().await.unwrap().total_entries, 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_is_inert() {
        let embedder = Arc::new(MockEmbeddingProvider::new(8));
        let service = SemanticCacheService::new(
            Arc::new(InMemorySemanticCache::new(100)),
            embedder.clone(),
            SemanticCacheConfig::default().with_enabled(false),
        );
        let request = LlmRequest::builder().user("hello").build();

        assert!(!service.store(&request, response("hi")).await);
        assert!(service.lookup(&request).await.is_none());
        assert_eq!(embedder.call_count(), 0);
    }
}

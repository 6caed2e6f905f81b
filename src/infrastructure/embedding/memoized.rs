use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use sha2::{Digest, Sha256};

use crate::domain::DomainError;
use crate::domain::embedding::EmbeddingProvider;

/// Embedding provider wrapper that memoizes recent texts
#[derive(Debug)]
pub struct MemoizedEmbeddingProvider<P: EmbeddingProvider> {
    inner: P,
    cache: Cache<String, Arc<Vec<f32>>>,
}

impl<P: EmbeddingProvider> MemoizedEmbeddingProvider<P> {
    pub fn new(inner: P, capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(capacity).build();

        Self { inner, cache }
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    fn key(text: &str) -> String {
        hex::encode(Sha256::digest(text.as_bytes()))
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for MemoizedEmbeddingProvider<P> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let key = Self::key(text);

        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(model = self.inner.model(), "Embedding memo hit");
            return Ok((*cached).clone());
        }

        let vector = self.inner.embed(text).await?;
        self.cache.insert(key, Arc::new(vector.clone())).await;

        Ok(vector)
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;

    #[tokio::test]
    async fn test_second_embed_served_from_memo() {
        let provider = MemoizedEmbeddingProvider::new(MockEmbeddingProvider::new(16), 10);

        let first = provider.embed("same text").await.unwrap();
        let second = provider.embed("same text").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.inner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_memoized() {
        let provider = MemoizedEmbeddingProvider::new(MockEmbeddingProvider::new(16).failing(), 10);

        assert!(provider.embed("x").await.is_err());
        provider.inner.set_failing(false);
        assert!(provider.embed("x").await.is_ok());
        assert_eq!(provider.inner.call_count(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let provider = MemoizedEmbeddingProvider::new(MockEmbeddingProvider::new(16), 10);

        provider.embed("x").await.unwrap();
        provider.invalidate_all();
        provider.embed("x").await.unwrap();

        assert_eq!(provider.inner.call_count(), 2);
    }
}

//! Semantic cache trait and statistics

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CacheEntry, CacheHit};
use crate::domain::DomainError;

/// Statistics for the semantic cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticCacheStats {
    /// Live entries, including ones that expired but were not yet swept
    pub total_entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Entries removed by capacity pressure or expiry
    pub evictions: u64,
    /// Average similarity of hits
    pub avg_hit_similarity: f32,
}

impl SemanticCacheStats {
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;

        if total == 0 {
            return 0.0;
        }

        self.hits as f32 / total as f32
    }
}

/// Vector store behind the semantic cache
#[async_trait]
pub trait SemanticCache: Send + Sync + Debug {
    /// Most similar unexpired entry in `partition` scoring at least `min_similarity`.
    ///
    /// Ties go to the most recently inserted entry.
    async fn find_similar(
        &self,
        partition: &str,
        embedding: &[f32],
        min_similarity: f32,
    ) -> Result<Option<CacheHit>, DomainError>;

    /// Whether an unexpired entry with this digest exists in `partition`
    async fn contains_digest(&self, partition: &str, digest: &str) -> Result<bool, DomainError>;

    /// Insert an entry. Returns `false` without writing when an unexpired entry with
    /// the same digest is already present.
    async fn store(&self, entry: CacheEntry) -> Result<bool, DomainError>;

    /// Remove expired entries, returning how many were dropped
    async fn cleanup_expired(&self) -> Result<usize, DomainError>;

    /// Remove every entry, returning how many were dropped
    async fn clear(&self) -> Result<usize, DomainError>;

    async fn stats(&self) -> Result<SemanticCacheStats, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = SemanticCacheStats {
            total_entries: 100,
            hits: 80,
            misses: 20,
            evictions: 5,
            avg_hit_similarity: 0.98,
        };

        assert!((stats.hit_rate() - 0.8).abs() < 0.01);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(SemanticCacheStats::default().hit_rate(), 0.0);
    }
}

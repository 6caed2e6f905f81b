//! Cache keys and entries

use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::time::Instant;

use crate::domain::llm::{LlmRequest, Usage};

/// Where a request's entries live and how it is identified within that partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    /// Tenant, optionally narrowed by requested model or task class
    pub partition: String,
    /// SHA-256 of the partition and transcript, hex encoded
    pub digest: String,
    /// Text that gets embedded
    pub text: String,
}

impl CacheKey {
    pub fn for_request(request: &LlmRequest, partition_by_model: bool) -> Self {
        let mut partition = request.tenant().to_string();

        if partition_by_model {
            match (&request.model, &request.task_class) {
                (Some(model), _) => partition.push_str(&format!("/model:{}", model)),
                (None, Some(task)) => partition.push_str(&format!("/task:{}", task)),
                (None, None) => partition.push_str("/*"),
            }
        }

        let text = request.transcript();

        let mut hasher = Sha256::new();
        hasher.update(partition.as_bytes());
        hasher.update(b"\n");
        hasher.update(text.as_bytes());
        let digest = hex::encode(hasher.finalize());

        Self {
            partition,
            digest,
            text,
        }
    }
}

/// Response payload kept in the cache
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub content: String,
    pub usage: Usage,
    pub provider: String,
    pub model: String,
}

/// One cached (embedding, response) pair
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub partition: String,
    pub digest: String,
    pub embedding: Vec<f32>,
    pub response: CachedResponse,
    pub inserted_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(key: CacheKey, embedding: Vec<f32>, response: CachedResponse, ttl: Duration) -> Self {
        Self {
            partition: key.partition,
            digest: key.digest,
            embedding,
            response,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) >= self.ttl
    }
}

/// A lookup hit together with its similarity score
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub entry: CacheEntry,
    pub similarity: f32,
}

//! Semantic cache domain models and traits
//!
//! Matches semantically similar requests by embedding similarity rather than
//! requiring exact key matches.

mod config;
mod entry;
mod repository;

pub use config::SemanticCacheConfig;
pub use entry::{CacheEntry, CacheHit, CacheKey, CachedResponse};
pub use repository::{SemanticCache, SemanticCacheStats};

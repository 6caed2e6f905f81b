use serde::{Deserialize, Serialize};

use crate::domain::llm::Usage;

/// Successful outcome of a gateway call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub content: String,
    pub usage: Usage,
    /// Estimated cost in USD; zero for cache hits
    pub cost_usd: f64,
    pub latency_ms: u64,
    pub provider_used: String,
    pub model_used: String,
    pub cache_hit: bool,
    pub correlation_id: String,
    /// Similarity of the matched entry when served from cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_similarity: Option<f32>,
    /// Provider invocations made, including retries
    pub attempts: u32,
}

//! Domain layer - Core gateway types, policies and traits

pub mod circuit;
pub mod embedding;
pub mod error;
pub mod gateway;
pub mod llm;
pub mod routing;
pub mod semantic_cache;
pub mod usage;

pub use circuit::{CircuitBreakerConfig, CircuitSnapshot, CircuitState};
pub use error::DomainError;
pub use gateway::{
    CandidateFailure, FailureReason, GatewayConfig, GatewayError, InvocationResult, RetryConfig,
};
pub use llm::{
    ErrorKind, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, Message, MessageRole,
    ProviderError, Usage,
};
pub use routing::{ProviderTarget, RoutingConfig, RoutingRule, RuleSet};
pub use semantic_cache::{SemanticCacheConfig, SemanticCacheStats};
pub use usage::{ModelPricing, PricingTable};

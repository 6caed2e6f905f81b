//! Application services

mod gateway_service;
mod semantic_cache_service;

pub use gateway_service::GatewayService;
pub use semantic_cache_service::SemanticCacheService;

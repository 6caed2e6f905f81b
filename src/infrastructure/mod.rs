//! Infrastructure layer - External service implementations

pub mod circuit;
pub mod embedding;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod semantic_cache;
pub mod services;

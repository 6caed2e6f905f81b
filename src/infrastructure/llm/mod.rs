//! LLM provider implementations

mod anthropic;
mod classify;
mod factory;
mod http_client;
mod openai;

pub use anthropic::AnthropicProvider;
pub use factory::{LlmProviderConfig, LlmProviderFactory, ProviderKind, ProviderRegistry};
pub use http_client::{HttpClient, HttpClientTrait, HttpError};
pub use openai::OpenAiProvider;

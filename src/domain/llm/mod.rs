//! LLM provider domain models and traits

mod error;
mod message;
mod provider;
mod request;
mod response;

pub use error::{ErrorKind, ProviderError};
pub use message::{Message, MessageRole};
pub use provider::{LlmProvider, invoke};
pub use request::{DEFAULT_TENANT, LlmRequest, LlmRequestBuilder};
pub use response::{FinishReason, LlmResponse, Usage};

#[cfg(test)]
pub use provider::mock::MockLlmProvider;

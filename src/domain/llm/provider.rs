use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{LlmRequest, LlmResponse, ProviderError};

/// Uniform interface to one upstream model backend.
///
/// Implementations perform exactly one outbound call per `chat` and must map every
/// provider-specific failure into a [`ProviderError`] of the shared taxonomy.
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request. `timeout` is the remaining budget for this call.
    async fn chat(
        &self,
        model: &str,
        request: &LlmRequest,
        timeout: Duration,
    ) -> Result<LlmResponse, ProviderError>;

    /// Identifier this provider is registered under
    fn provider_id(&self) -> &str;
}

/// Invoke `provider` for `model`, bounded by `deadline`.
///
/// Rejects requests without messages and deadlines that already passed before any
/// network call is made. If the provider has not answered when the deadline elapses
/// the call is abandoned and reported as a `Timeout`.
pub async fn invoke(
    provider: &dyn LlmProvider,
    model: &str,
    request: &LlmRequest,
    deadline: Instant,
) -> Result<LlmResponse, ProviderError> {
    if request.messages.is_empty() {
        return Err(ProviderError::invalid_request(
            provider.provider_id(),
            "request must contain at least one message",
        ));
    }

    let now = Instant::now();

    if deadline <= now {
        return Err(ProviderError::deadline_exceeded(provider.provider_id()));
    }

    let remaining = deadline - now;

    match tokio::time::timeout_at(deadline, provider.chat(model, request, remaining)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::timeout(
            provider.provider_id(),
            format!("no response within {}ms", remaining.as_millis()),
        )),
    }
}

//! Mapping of HTTP failures onto the provider error taxonomy

use serde::Deserialize;

use super::http_client::HttpError;
use crate::domain::llm::{ErrorKind, ProviderError};

const MAX_MESSAGE_LEN: usize = 512;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Classify an HTTP failure for `provider`.
///
/// `code_override` sees the provider's `error.code`, then its `error.type`, and may
/// pick a kind that takes precedence over the status mapping.
pub(crate) fn classify_http_error(
    provider: &str,
    error: HttpError,
    code_override: fn(&str) -> Option<ErrorKind>,
) -> ProviderError {
    match error {
        HttpError::Timeout => ProviderError::timeout(provider, "request timed out"),
        HttpError::Transport(message) => ProviderError::unavailable(provider, message),
        HttpError::Decode(message) => {
            ProviderError::unavailable(provider, format!("unparsable response: {}", message))
        }
        HttpError::Status { status, body } => {
            let parsed = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error)
                .unwrap_or_default();

            let code = parsed.code.as_ref().and_then(|c| c.as_str());
            let kind = [code, parsed.error_type.as_deref()]
                .into_iter()
                .flatten()
                .find_map(code_override)
                .unwrap_or_else(|| ErrorKind::from_http_status(status));

            let detail = parsed.message.unwrap_or(body);
            let mut message = format!("HTTP {}: {}", status, detail);
            if message.len() > MAX_MESSAGE_LEN {
                let cut = (0..=MAX_MESSAGE_LEN)
                    .rev()
                    .find(|i| message.is_char_boundary(*i))
                    .unwrap_or(0);
                message.truncate(cut);
            }

            ProviderError::new(kind, provider, message)
        }
    }
}

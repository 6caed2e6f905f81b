//! Failure taxonomy shared by provider adapters and the gateway

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Exhaustive classification of invocation failures.
///
/// The first five kinds are produced at the provider adapter boundary; the last two
/// only by the gateway itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RateLimited,
    AuthError,
    Timeout,
    InvalidRequest,
    UpstreamUnavailable,
    AllProvidersExhausted,
    DeadlineExceeded,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "RateLimited",
            Self::AuthError => "AuthError",
            Self::Timeout => "Timeout",
            Self::InvalidRequest => "InvalidRequest",
            Self::UpstreamUnavailable => "UpstreamUnavailable",
            Self::AllProvidersExhausted => "AllProvidersExhausted",
            Self::DeadlineExceeded => "DeadlineExceeded",
        }
    }

    /// Whether the gateway may move on to another candidate after this failure
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Timeout | Self::UpstreamUnavailable
        )
    }

    /// Failures that describe the request or credentials rather than provider health.
    /// They end the call immediately.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AuthError | Self::InvalidRequest)
    }

    /// After these, no further candidate on the same provider is tried within one call
    pub fn excludes_provider(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Timeout)
    }

    /// Map an HTTP status from an upstream into the taxonomy.
    /// Anything unrecognised is treated as the upstream being unavailable.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::AuthError,
            429 => Self::RateLimited,
            408 => Self::Timeout,
            400 | 404 | 413 | 422 => Self::InvalidRequest,
            _ => Self::UpstreamUnavailable,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure of one provider invocation
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{provider}: {kind}: {message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub provider: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ErrorKind, provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, provider, message)
    }

    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthError, provider, message)
    }

    pub fn timeout(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, provider, message)
    }

    pub fn invalid_request(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, provider, message)
    }

    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamUnavailable, provider, message)
    }

    pub fn deadline_exceeded(provider: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::DeadlineExceeded,
            provider,
            "deadline already passed",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ErrorKind::from_http_status(401), ErrorKind::AuthError);
        assert_eq!(ErrorKind::from_http_status(403), ErrorKind::AuthError);
        assert_eq!(ErrorKind::from_http_status(429), ErrorKind::RateLimited);
        assert_eq!(ErrorKind::from_http_status(408), ErrorKind::Timeout);
        assert_eq!(ErrorKind::from_http_status(400), ErrorKind::InvalidRequest);
        assert_eq!(ErrorKind::from_http_status(422), ErrorKind::InvalidRequest);
        assert_eq!(ErrorKind::from_http_status(500), ErrorKind::UpstreamUnavailable);
        assert_eq!(ErrorKind::from_http_status(529), ErrorKind::UpstreamUnavailable);
        assert_eq!(ErrorKind::from_http_status(418), ErrorKind::UpstreamUnavailable);
    }

    #[test]
    fn test_retry_classification() {
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(ErrorKind::UpstreamUnavailable.is_retryable());
        assert!(!ErrorKind::AuthError.is_retryable());
        assert!(!ErrorKind::InvalidRequest.is_retryable());

        assert!(ErrorKind::AuthError.is_terminal());
        assert!(ErrorKind::InvalidRequest.is_terminal());
        assert!(!ErrorKind::UpstreamUnavailable.is_terminal());
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::AllProvidersExhausted).unwrap();
        assert_eq!(json, "\"all_providers_exhausted\"");
        assert_eq!(ErrorKind::AllProvidersExhausted.to_string(), "AllProvidersExhausted");
    }

    #[test]
    fn test_provider_error_display() {
        let error = ProviderError::rate_limited("openai", "slow down");
        assert_eq!(error.to_string(), "openai: RateLimited: slow down");
    }
}

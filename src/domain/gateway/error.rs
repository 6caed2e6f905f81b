use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::llm::{ErrorKind, ProviderError};
use crate::domain::routing::ProviderTarget;

/// Why a candidate did not produce the result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// Circuit open or half-open trial already taken; not an attempt
    CircuitOpen,
    /// Provider already rate limited or timed out earlier in this call; not an attempt
    SkippedAfterFailure { kind: ErrorKind },
    /// Provider call failed
    Error { kind: ErrorKind, message: String },
}

/// Per-candidate diagnosis attached to gateway failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFailure {
    pub provider: String,
    pub model: String,
    #[serde(flatten)]
    pub reason: FailureReason,
}

impl CandidateFailure {
    pub fn circuit_open(target: &ProviderTarget) -> Self {
        Self::new(target, FailureReason::CircuitOpen)
    }

    pub fn skipped(target: &ProviderTarget, kind: ErrorKind) -> Self {
        Self::new(target, FailureReason::SkippedAfterFailure { kind })
    }

    pub fn error(target: &ProviderTarget, error: &ProviderError) -> Self {
        Self::new(
            target,
            FailureReason::Error {
                kind: error.kind,
                message: error.message.clone(),
            },
        )
    }

    fn new(target: &ProviderTarget, reason: FailureReason) -> Self {
        Self {
            provider: target.provider.clone(),
            model: target.model.clone(),
            reason,
        }
    }

    /// Error kind of an attempted candidate
    pub fn kind(&self) -> Option<ErrorKind> {
        match &self.reason {
            FailureReason::Error { kind, .. } => Some(*kind),
            FailureReason::CircuitOpen | FailureReason::SkippedAfterFailure { .. } => None,
        }
    }
}

impl fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            FailureReason::CircuitOpen => write!(f, "{}:CircuitOpen", self.provider),
            FailureReason::SkippedAfterFailure { kind } => {
                write!(f, "{}:Skipped({})", self.provider, kind)
            }
            FailureReason::Error { kind, .. } => write!(f, "{}:{}", self.provider, kind),
        }
    }
}

/// Failed outcome of a gateway call
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct GatewayError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<CandidateFailure>,
}

impl GatewayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<CandidateFailure>) -> Self {
        self.details = details;
        self
    }

    pub fn exhausted(details: Vec<CandidateFailure>) -> Self {
        let summary = details
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        Self::new(
            ErrorKind::AllProvidersExhausted,
            format!("all candidates failed: [{}]", summary),
        )
        .with_details(details)
    }

    pub fn deadline_exceeded(details: Vec<CandidateFailure>) -> Self {
        Self::new(
            ErrorKind::DeadlineExceeded,
            "deadline reached before a candidate succeeded",
        )
        .with_details(details)
    }

    /// Propagate a request-level failure (auth or invalid request) from a provider
    pub fn terminal(error: &ProviderError, details: Vec<CandidateFailure>) -> Self {
        Self::new(error.kind, error.to_string()).with_details(details)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }
}

//! API error responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::domain::gateway::{CandidateFailure, GatewayError};
use crate::domain::llm::ErrorKind;
use crate::domain::routing::RoutingError;
use crate::domain::DomainError;

/// Error categories exposed to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    NotFoundError,
    RateLimitError,
    /// Upstream rejected the gateway's credentials
    UpstreamAuthError,
    TimeoutError,
    ServerError,
    ServiceUnavailableError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::RateLimitError => write!(f, "rate_limit_error"),
            Self::UpstreamAuthError => write!(f, "upstream_auth_error"),
            Self::TimeoutError => write!(f, "timeout_error"),
            Self::ServerError => write!(f, "server_error"),
            Self::ServiceUnavailableError => write!(f, "service_unavailable_error"),
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    /// Gateway error kind, e.g. `all_providers_exhausted`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Per-candidate failures, in attempt order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<CandidateFailure>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    code: None,
                    details: Vec::new(),
                },
            },
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = Some(code.into());
        self
    }

    pub fn with_details(mut self, details: Vec<CandidateFailure>) -> Self {
        self.response.error.details = details;
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorType::ServerError, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorType::ServiceUnavailableError,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let (status, error_type) = match err.kind {
            ErrorKind::InvalidRequest => {
                (StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError)
            }
            ErrorKind::AuthError => (StatusCode::BAD_GATEWAY, ApiErrorType::UpstreamAuthError),
            ErrorKind::RateLimited => (StatusCode::TOO_MANY_REQUESTS, ApiErrorType::RateLimitError),
            ErrorKind::Timeout | ErrorKind::DeadlineExceeded => {
                (StatusCode::GATEWAY_TIMEOUT, ApiErrorType::TimeoutError)
            }
            ErrorKind::UpstreamUnavailable | ErrorKind::AllProvidersExhausted => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiErrorType::ServiceUnavailableError,
            ),
        };

        let code = serde_json::to_value(err.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| err.kind.to_string());

        Self::new(status, error_type, err.message)
            .with_code(code)
            .with_details(err.details)
    }
}

impl From<RoutingError> for ApiError {
    fn from(err: RoutingError) -> Self {
        Self::bad_request(err.to_string()).with_code("invalid_routing")
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::Validation { message } => Self::bad_request(message),
            DomainError::Provider { provider, message } => {
                Self::unavailable(format!("{}: {}", provider, message))
            }
            DomainError::Configuration { message } => Self::internal(message),
            DomainError::Internal { message } => Self::internal(message),
            DomainError::Cache { message } => Self::internal(message),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::routing::ProviderTarget;

    #[test]
    fn test_gateway_error_status_mapping() {
        let cases = [
            (ErrorKind::InvalidRequest, StatusCode::BAD_REQUEST),
            (ErrorKind::AuthError, StatusCode::BAD_GATEWAY),
            (ErrorKind::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (ErrorKind::Timeout, StatusCode::GATEWAY_TIMEOUT),
            (ErrorKind::DeadlineExceeded, StatusCode::GATEWAY_TIMEOUT),
            (ErrorKind::UpstreamUnavailable, StatusCode::SERVICE_UNAVAILABLE),
            (ErrorKind::AllProvidersExhausted, StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (kind, status) in cases {
            let err: ApiError = GatewayError::new(kind, "boom").into();
            assert_eq!(err.status, status, "{:?}", kind);
        }
    }

    #[test]
    fn test_exhausted_error_carries_details() {
        let target = ProviderTarget::new("A", "X");
        let err: ApiError =
            GatewayError::exhausted(vec![CandidateFailure::circuit_open(&target)]).into();

        assert_eq!(err.response.error.code.as_deref(), Some("all_providers_exhausted"));
        assert_eq!(err.response.error.details.len(), 1);

        let body = serde_json::to_value(&err.response).unwrap();
        assert_eq!(body["error"]["details"][0]["reason"], "circuit_open");
        assert_eq!(body["error"]["type"], "service_unavailable_error");
    }

    #[test]
    fn test_domain_error_conversion() {
        let err: ApiError = DomainError::validation("bad").into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: ApiError = DomainError::cache("store down").into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! Model invocation endpoint

use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::gateway::InvocationResult;
use crate::domain::llm::LlmRequest;

/// Invocation request body: an [`LlmRequest`] plus an optional relative timeout
#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    #[serde(flatten)]
    pub request: LlmRequest,
    /// Relative time budget; the earlier of this and `deadline` applies
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl InvokeRequest {
    fn into_request(self) -> LlmRequest {
        let mut request = self.request;

        // A budget too large to represent sets no tighter bound
        if let Some(from_timeout) = self.timeout_ms.and_then(deadline_after) {
            request.deadline = Some(match request.deadline {
                Some(deadline) => deadline.min(from_timeout),
                None => from_timeout,
            });
        }

        request
    }
}

fn deadline_after(timeout_ms: u64) -> Option<DateTime<Utc>> {
    let millis = i64::try_from(timeout_ms).ok()?;
    let budget = chrono::Duration::try_milliseconds(millis)?;
    Utc::now().checked_add_signed(budget)
}

/// POST /v1/invoke
pub async fn invoke(
    State(state): State<AppState>,
    Json(body): Json<InvokeRequest>,
) -> Result<Json<InvocationResult>, ApiError> {
    let request = body.into_request();

    debug!(
        correlation_id = %request.correlation_id,
        messages = request.messages.len(),
        "Invocation received"
    );

    let result = state.gateway.execute(request).await?;

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_tightens_deadline() {
        let far = Utc::now() + chrono::Duration::hours(1);
        let body: InvokeRequest = serde_json::from_value(serde_json::json!({
            "messages": [{"role": "user", "content": "hi"}],
            "deadline": far.to_rfc3339(),
            "timeout_ms": 1000
        }))
        .unwrap();

        let request = body.into_request();
        assert!(request.deadline.unwrap() < far);
    }

    #[test]
    fn test_flattened_fields_parse() {
        let body: InvokeRequest = serde_json::from_value(serde_json::json!({
            "messages": [{"role": "user", "content": "hi"}],
            "task_class": "code",
            "tenant_id": "acme",
            "correlation_id": "req-1"
        }))
        .unwrap();

        assert_eq!(body.request.task_class.as_deref(), Some("code"));
        assert_eq!(body.request.tenant(), "acme");
        assert_eq!(body.request.correlation_id, "req-1");
        assert!(body.into_request().deadline.is_none());
    }

    #[test]
    fn test_oversized_timeout_leaves_deadline_alone() {
        let body: InvokeRequest = serde_json::from_value(serde_json::json!({
            "messages": [{"role": "user", "content": "hi"}],
            "timeout_ms": u64::MAX
        }))
        .unwrap();
        assert!(body.into_request().deadline.is_none());

        let far = Utc::now() + chrono::Duration::hours(1);
        let body: InvokeRequest = serde_json::from_value(serde_json::json!({
            "messages": [{"role": "user", "content": "hi"}],
            "deadline": far.to_rfc3339(),
            "timeout_ms": 100_000_000_000_000_000u64
        }))
        .unwrap();
        assert_eq!(body.into_request().deadline, Some(far));
    }
}

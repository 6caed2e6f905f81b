//! Health check endpoints

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;
use crate::domain::circuit::CircuitState;

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check status
#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Liveness: 200 while the process is serving
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness: degraded while some provider circuits are open, unavailable when
/// none can take traffic
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let checks = vec![check_providers(&state)];

    let overall_status = checks
        .iter()
        .map(|c| c.status)
        .max_by_key(|s| match s {
            HealthStatus::Healthy => 0,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 2,
        })
        .unwrap_or(HealthStatus::Healthy);

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

fn check_providers(state: &AppState) -> HealthCheck {
    let ids = state.gateway.providers().ids();
    let health = state.gateway.health();
    let open: Vec<&String> = ids
        .iter()
        .filter(|id| health.state(id) == CircuitState::Open)
        .collect();

    let (status, message) = if ids.is_empty() {
        (HealthStatus::Unhealthy, Some("no providers registered".to_string()))
    } else if open.len() == ids.len() {
        (HealthStatus::Unhealthy, Some("all provider circuits open".to_string()))
    } else if !open.is_empty() {
        let names: Vec<&str> = open.iter().map(|s| s.as_str()).collect();
        (
            HealthStatus::Degraded,
            Some(format!("open circuits: {}", names.join(", "))),
        )
    } else {
        (HealthStatus::Healthy, None)
    };

    HealthCheck {
        name: "providers".to_string(),
        status,
        message,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::extract::State;
    use axum::response::IntoResponse;

    use super::*;
    use crate::api::state::mock;
    use crate::domain::circuit::CallOutcome;

    #[tokio::test]
    async fn test_health_check_ok() {
        let response = health_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_degrades_with_open_circuit() {
        let state = mock::healthy_state();
        assert_eq!(check_providers(&state).status, HealthStatus::Healthy);

        let health = state.gateway.health();
        let admission = health.try_acquire("A");
        health.record_outcome("A", admission, CallOutcome::AuthFailure, Duration::ZERO);
        assert_eq!(check_providers(&state).status, HealthStatus::Degraded);

        let admission = health.try_acquire("B");
        health.record_outcome("B", admission, CallOutcome::AuthFailure, Duration::ZERO);

        let response = ready_check(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

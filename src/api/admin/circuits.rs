//! Circuit breaker inspection and reset

use axum::extract::{Path, State};
use serde::Serialize;
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::circuit::{CircuitSnapshot, CircuitState};

#[derive(Debug, Serialize)]
pub struct CircuitsResponse {
    pub circuits: Vec<CircuitSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct CircuitResetResponse {
    pub provider: String,
    pub previous_state: CircuitState,
    pub state: CircuitState,
}

/// GET /admin/circuits
pub async fn list_circuits(State(state): State<AppState>) -> Json<CircuitsResponse> {
    let ids = state.gateway.providers().ids();
    let circuits = state
        .gateway
        .health()
        .snapshots(ids.iter().map(String::as_str));

    Json(CircuitsResponse { circuits })
}

/// POST /admin/circuits/{provider}/reset
pub async fn reset_circuit(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Json<CircuitResetResponse>, ApiError> {
    if !state.gateway.providers().contains(&provider) {
        return Err(ApiError::not_found(format!("unknown provider '{}'", provider)));
    }

    let health = state.gateway.health();
    let previous_state = health.reset(&provider);

    info!(provider = %provider, previous = %previous_state, "Circuit reset by operator");

    Ok(Json(CircuitResetResponse {
        state: health.state(&provider),
        provider,
        previous_state,
    }))
}

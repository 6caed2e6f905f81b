//! Routing config inspection and replacement

use axum::extract::State;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::routing::RoutingConfig;

/// GET /admin/routing
pub async fn get_routing(State(state): State<AppState>) -> Json<RoutingConfig> {
    Json(state.gateway.routing().as_ref().clone())
}

/// PUT /admin/routing
pub async fn replace_routing(
    State(state): State<AppState>,
    Json(config): Json<RoutingConfig>,
) -> Result<Json<RoutingConfig>, ApiError> {
    state.gateway.update_routing(config)?;

    Ok(Json(state.gateway.routing().as_ref().clone()))
}

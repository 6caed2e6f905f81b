//! Operator endpoints for circuits, routing and the semantic cache

pub mod cache;
pub mod circuits;
pub mod routing;

use axum::{
    Router,
    routing::{delete, get, post},
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/circuits", get(circuits::list_circuits))
        .route("/circuits/{provider}/reset", post(circuits::reset_circuit))
        .route(
            "/routing",
            get(routing::get_routing).put(routing::replace_routing),
        )
        .route("/cache/stats", get(cache::cache_stats))
        .route("/cache", delete(cache::clear_cache))
}

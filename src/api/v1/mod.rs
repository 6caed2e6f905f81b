//! Version 1 invocation API

pub mod invoke;

use axum::{Router, routing::post};

use super::state::AppState;

/// Create the v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new().route("/invoke", post(invoke::invoke))
}

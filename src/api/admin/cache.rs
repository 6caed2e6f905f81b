//! Semantic cache statistics and invalidation

use axum::extract::State;
use serde::Serialize;
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::semantic_cache::SemanticCacheStats;

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub enabled: bool,
    #[serde(flatten)]
    pub stats: SemanticCacheStats,
    pub hit_rate: f32,
}

#[derive(Debug, Serialize)]
pub struct CacheClearResponse {
    pub cleared: usize,
}

/// GET /admin/cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> Result<Json<CacheStatsResponse>, ApiError> {
    let Some(cache) = state.gateway.cache() else {
        return Ok(Json(CacheStatsResponse {
            enabled: false,
            stats: SemanticCacheStats::default(),
            hit_rate: 0.0,
        }));
    };

    let stats = cache.stats().await?;

    Ok(Json(CacheStatsResponse {
        enabled: cache.is_enabled(),
        hit_rate: stats.hit_rate(),
        stats,
    }))
}

/// DELETE /admin/cache
pub async fn clear_cache(State(state): State<AppState>) -> Result<Json<CacheClearResponse>, ApiError> {
    let cleared = match state.gateway.cache() {
        Some(cache) => cache.clear().await?,
        None => 0,
    };

    info!(cleared, "Semantic cache cleared by operator");

    Ok(Json(CacheClearResponse { cleared }))
}

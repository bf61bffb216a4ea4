//! Liveness endpoint, with a one-line summary of tracker load.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub tracking_enabled: bool,
    pub sessions: usize,
    pub jobs: usize,
    pub pending_updates: usize,
}

/// GET /api/health
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    let tracker = state.lock_tracker()?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        tracking_enabled: tracker.is_enabled(),
        sessions: tracker.state().session_count(),
        jobs: tracker.state().job_count(),
        pending_updates: tracker.pending_updates(),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}

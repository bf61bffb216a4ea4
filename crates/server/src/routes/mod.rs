//! API route handlers for the console server.

pub mod health;
pub mod jobtracker;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET  /api/health - Health check
/// - POST /api/jobtracker/jobs - Job created
/// - POST /api/jobtracker/jobs/start - Job started
/// - POST /api/jobtracker/jobs/end - Job ended or failed
/// - GET  /api/jobtracker/jobs/{id} - Job details
/// - GET  /api/jobtracker/enabled - Whether tracking is on
/// - PUT  /api/jobtracker/enabled - Switch tracking on/off
/// - POST /api/jobtracker/reset - Drop all sessions and jobs
/// - POST /api/jobtracker/flush - Deliver pending state changes now
/// - GET  /api/jobtracker/sessions - Session list
/// - GET  /api/jobtracker/tree - Rendered job tree
/// - GET  /api/jobtracker/stream - SSE stream of tree-model events
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", jobtracker::router())
        .with_state(state)
}

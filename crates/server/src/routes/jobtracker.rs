//! Job tracker ingestion and inspection endpoints.
//!
//! Ingestion (`POST /jobtracker/jobs*`) is fire-and-forget: events for
//! unknown jobs, empty names or a disabled tracker are dropped by the tracker
//! and the caller still gets `204 No Content`.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use pim_console_core::{JobInfo, NodeId, RowSnapshot, SessionSummary, TreeProjection};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub session: String,
    pub job: String,
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub debug_info: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StartJobRequest {
    pub job: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndJobRequest {
    pub job: String,
    /// Empty for success.
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct EnabledBody {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct TreeResponse {
    pub headers: Vec<String>,
    pub rows: Vec<RowSnapshot>,
}

/// POST /api/jobtracker/jobs
async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateJobRequest>,
) -> ApiResult<StatusCode> {
    state.lock_tracker()?.create(
        &req.session,
        &req.job,
        &req.parent,
        &req.job_type,
        &req.debug_info,
    );
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/jobtracker/jobs/start
async fn start_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartJobRequest>,
) -> ApiResult<StatusCode> {
    state.lock_tracker()?.start(&req.job);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/jobtracker/jobs/end
async fn end_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EndJobRequest>,
) -> ApiResult<StatusCode> {
    state.lock_tracker()?.end(&req.job, &req.error);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/jobtracker/jobs/{id} — `id` is the numeric job id.
async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<JobInfo>> {
    let raw: i64 = raw_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid job id: {raw_id}")))?;
    let Some(id) = NodeId::from_raw(raw).and_then(NodeId::as_job) else {
        return Err(ApiError::BadRequest(format!("{raw} is not a job id")));
    };
    let tracker = state.lock_tracker()?;
    let info = tracker.state().info(id)?.clone();
    Ok(Json(info))
}

/// GET /api/jobtracker/enabled
async fn get_enabled(State(state): State<Arc<AppState>>) -> ApiResult<Json<EnabledBody>> {
    let enabled = state.lock_tracker()?.is_enabled();
    Ok(Json(EnabledBody { enabled }))
}

/// PUT /api/jobtracker/enabled
async fn set_enabled(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EnabledBody>,
) -> ApiResult<Json<EnabledBody>> {
    let mut tracker = state.lock_tracker()?;
    tracker.set_enabled(body.enabled);
    tracing::info!(enabled = body.enabled, "Job tracking switched");
    Ok(Json(EnabledBody {
        enabled: tracker.is_enabled(),
    }))
}

/// POST /api/jobtracker/reset
async fn reset(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    state.lock_tracker()?.reset();
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/jobtracker/flush
async fn flush(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    state.lock_tracker()?.flush();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/jobtracker/sessions
async fn list_sessions(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<SessionSummary>>> {
    let summaries = state.lock_tracker()?.state().session_summaries();
    Ok(Json(summaries))
}

/// GET /api/jobtracker/tree
async fn tree(State(state): State<Arc<AppState>>) -> ApiResult<Json<TreeResponse>> {
    let tracker = state.lock_tracker()?;
    let model = TreeProjection::new(tracker.state());
    let headers = (0..model.column_count())
        .filter_map(|column| model.header(column))
        .map(str::to_string)
        .collect();
    Ok(Json(TreeResponse {
        headers,
        rows: model.snapshot(),
    }))
}

/// GET /api/jobtracker/stream — SSE stream of tree-model events.
///
/// A client that falls behind the channel gets a `lagged` event and should
/// refetch `/tree`.
async fn stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();

    let stream = async_stream::stream! {
        let mut rx = rx;
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let json = serde_json::to_string(&event).unwrap_or_default();
                    yield Ok(Event::default().event("model").data(json));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "SSE client lagging behind job tracker");
                    yield Ok(Event::default().event("lagged").data(skipped.to_string()));
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Build the job tracker router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobtracker/jobs", post(create_job))
        .route("/jobtracker/jobs/start", post(start_job))
        .route("/jobtracker/jobs/end", post(end_job))
        .route("/jobtracker/jobs/{id}", get(get_job))
        .route("/jobtracker/enabled", get(get_enabled).put(set_enabled))
        .route("/jobtracker/reset", post(reset))
        .route("/jobtracker/flush", post(flush))
        .route("/jobtracker/sessions", get(list_sessions))
        .route("/jobtracker/tree", get(tree))
        .route("/jobtracker/stream", get(stream))
}

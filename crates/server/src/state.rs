// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::{Arc, MutexGuard};
use std::time::{Duration, Instant};

use pim_console_core::{
    EventTracker, ModelEvent, ProjectionObserver, SharedTracker, DEFAULT_FLUSH_INTERVAL,
};
use tokio::sync::broadcast;

use crate::error::{ApiError, ApiResult};

/// Capacity of the projection notification channel.
const MODEL_EVENT_CAPACITY: usize = 1024;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// The job tracker. One mutex covers tree, indices, pending batch and
    /// timer flag; the debounce task takes the same lock to flush.
    pub tracker: SharedTracker,
    /// Republishes tracker notifications as tree-model events for SSE.
    pub projection: ProjectionObserver,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(flush_interval: Duration, enabled: bool) -> Arc<Self> {
        let tracker = EventTracker::new_shared(flush_interval);
        let projection = ProjectionObserver::new(MODEL_EVENT_CAPACITY);
        match tracker.lock() {
            Ok(mut guard) => {
                guard.add_observer(projection.clone());
                guard.set_enabled(enabled);
            }
            Err(e) => tracing::error!("Mutex poisoned setting up job tracker: {e}"),
        }
        Arc::new(Self {
            start_time: Instant::now(),
            tracker,
            projection,
        })
    }

    /// Enabled tracker with the default 200 ms debounce.
    pub fn with_defaults() -> Arc<Self> {
        Self::new(DEFAULT_FLUSH_INTERVAL, true)
    }

    pub fn lock_tracker(&self) -> ApiResult<MutexGuard<'_, EventTracker>> {
        self.tracker
            .lock()
            .map_err(|e| ApiError::Internal(format!("job tracker mutex poisoned: {e}")))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.projection.subscribe()
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

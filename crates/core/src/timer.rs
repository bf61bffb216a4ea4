// crates/core/src/timer.rs
//! Debounce timers for coalescing "updated" notifications.
//!
//! The tracker arms its timer on the first state change after a flush and
//! leaves it alone until that flush happens, so a burst of start/end events
//! turns into one batched notification per interval.

use std::sync::{Mutex, Weak};
use std::time::Duration;

use tokio::task::AbortHandle;

use crate::tracker::EventTracker;

/// Default debounce window.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(200);

/// Something that can call [`EventTracker::flush`] later.
pub trait FlushTimer: Send {
    /// Schedule a single flush after `delay`.
    fn arm(&mut self, delay: Duration);

    /// Drop the scheduled flush, if any.
    fn cancel(&mut self) {}
}

/// No deferred callback; the owner calls `flush()` itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualFlush;

impl FlushTimer for ManualFlush {
    fn arm(&mut self, _delay: Duration) {}
}

/// Single-shot tokio task that locks the shared tracker and flushes it.
pub struct TokioFlushTimer {
    tracker: Weak<Mutex<EventTracker>>,
    pending: Option<AbortHandle>,
}

impl TokioFlushTimer {
    pub fn new(tracker: Weak<Mutex<EventTracker>>) -> Self {
        Self {
            tracker,
            pending: None,
        }
    }
}

impl FlushTimer for TokioFlushTimer {
    fn arm(&mut self, delay: Duration) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("No tokio runtime, job updates wait for an explicit flush");
                return;
            }
        };

        self.cancel();
        let tracker = self.tracker.clone();
        let task = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            // Tracker dropped while the timer was pending.
            let Some(tracker) = tracker.upgrade() else {
                return;
            };
            let result = tracker.lock();
            match result {
                Ok(mut guard) => guard.flush(),
                Err(e) => tracing::error!("Mutex poisoned flushing job tracker: {e}"),
            };
        });
        self.pending = Some(task.abort_handle());
    }

    fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

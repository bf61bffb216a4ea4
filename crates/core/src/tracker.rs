// crates/core/src/tracker.rs
//! Session → job event tracker.
//!
//! Event sources report job lifecycles by name (`create`, `start`, `end`).
//! Delivery is best-effort: a child may be announced before its parent, a
//! name may be reused, and start/end may reference jobs we never saw. None
//! of that is an error; the tracker patches what it can and drops the rest.
//!
//! Structural changes (new session, new job) are reported to observers
//! synchronously. State changes are queued as `(row, parent)` pairs and
//! delivered as one `Updated` batch when the debounce timer fires.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use crate::error::TrackerError;
use crate::ids::{JobId, NodeId, FIRST_JOB_ID};
use crate::timer::{FlushTimer, ManualFlush, TokioFlushTimer};
use crate::types::{JobInfo, JobState, SessionSummary};

/// Job type given to parents synthesized for out-of-order children.
pub const PLACEHOLDER_JOB_TYPE: &str = "dummy job type";
/// Debug info given to synthesized parents.
pub const PLACEHOLDER_DEBUG_INFO: &str = "added by job tracker";

/// Notifications emitted by [`EventTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// A row is about to be appended at `pos` under `parent`.
    AboutToAdd { pos: usize, parent: NodeId },
    /// The row announced by the preceding `AboutToAdd` now exists.
    Added { pos: usize, parent: NodeId },
    /// Rows whose job changed state since the last flush, in arrival order.
    Updated(Vec<(usize, NodeId)>),
    /// All state is about to be dropped.
    AboutToReset,
    /// All state was dropped.
    Reset,
}

/// Receives tracker notifications along with a read-only view of the state
/// as it is at that moment.
pub trait TrackerObserver: Send {
    fn on_event(&mut self, state: &TrackerState, event: &TrackerEvent);
}

impl<F> TrackerObserver for F
where
    F: FnMut(&TrackerState, &TrackerEvent) + Send,
{
    fn on_event(&mut self, state: &TrackerState, event: &TrackerEvent) {
        self(state, event)
    }
}

/// Sessions, jobs and the indices over them. Read-only outside this module.
#[derive(Debug)]
pub struct TrackerState {
    sessions: Vec<String>,
    session_rows: HashMap<String, usize>,
    jobs: HashMap<JobId, JobInfo>,
    name_to_id: HashMap<String, JobId>,
    children: HashMap<NodeId, Vec<JobId>>,
    next_id: JobId,
}

impl TrackerState {
    fn new() -> Self {
        Self {
            sessions: Vec::new(),
            session_rows: HashMap::new(),
            jobs: HashMap::new(),
            name_to_id: HashMap::new(),
            children: HashMap::new(),
            next_id: FIRST_JOB_ID,
        }
    }

    fn clear(&mut self) {
        self.sessions.clear();
        self.session_rows.clear();
        self.jobs.clear();
        self.name_to_id.clear();
        self.children.clear();
    }

    /// Session names in first-appearance order.
    pub fn sessions(&self) -> &[String] {
        &self.sessions
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session_id(&self, name: &str) -> Option<NodeId> {
        self.session_rows.get(name).map(|&row| NodeId::Session(row))
    }

    pub fn session_name(&self, id: NodeId) -> Option<&str> {
        match id {
            NodeId::Session(row) => self.sessions.get(row).map(String::as_str),
            _ => None,
        }
    }

    pub fn session_summaries(&self) -> Vec<SessionSummary> {
        self.sessions
            .iter()
            .enumerate()
            .map(|(row, name)| {
                let id = NodeId::Session(row);
                SessionSummary {
                    name: name.clone(),
                    id: id.raw(),
                    row,
                    job_count: self.child_count(id),
                }
            })
            .collect()
    }

    pub fn job(&self, id: JobId) -> Option<&JobInfo> {
        self.jobs.get(&id)
    }

    /// Like [`job`](Self::job), for ids that came out of this tracker's own
    /// notifications and therefore must exist.
    pub fn info(&self, id: JobId) -> Result<&JobInfo, TrackerError> {
        self.jobs.get(&id).ok_or_else(|| {
            tracing::error!(job_id = id, "Lookup of a job id the tracker never issued");
            TrackerError::unknown_job(id)
        })
    }

    /// Id of the most recent job created under `name`.
    pub fn job_id(&self, name: &str) -> Option<JobId> {
        self.name_to_id.get(name).copied()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Child jobs of `parent`, in creation order (and therefore id order).
    pub fn children(&self, parent: NodeId) -> &[JobId] {
        self.children.get(&parent).map_or(&[], Vec::as_slice)
    }

    pub fn child_count(&self, parent: NodeId) -> usize {
        self.children(parent).len()
    }

    /// Row of `id` under `parent`.
    ///
    /// Child lists only ever get ids appended from a monotonic counter, so
    /// they are sorted and a binary search is enough.
    pub fn row_for_job(&self, id: JobId, parent: NodeId) -> Option<usize> {
        self.children(parent).binary_search(&id).ok()
    }

    /// Parent of `id`; `Root` for sessions and for anything unknown.
    pub fn parent_for(&self, id: NodeId) -> NodeId {
        match id {
            NodeId::Job(job) => self.jobs.get(&job).map_or(NodeId::Root, |info| info.parent),
            NodeId::Session(_) | NodeId::Root => NodeId::Root,
        }
    }

    /// Id the next created job will receive.
    pub fn next_job_id(&self) -> JobId {
        self.next_id
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Shared handle used by multi-threaded transports.
pub type SharedTracker = Arc<Mutex<EventTracker>>;

/// Ingests job lifecycle events and keeps the session → job tree.
pub struct EventTracker {
    state: TrackerState,
    pending: Vec<(usize, NodeId)>,
    enabled: bool,
    timer_armed: bool,
    flush_interval: Duration,
    timer: Box<dyn FlushTimer>,
    observers: Vec<Box<dyn TrackerObserver>>,
}

impl EventTracker {
    /// Tracker whose pending updates are only delivered by explicit
    /// [`flush`](Self::flush) calls.
    pub fn new() -> Self {
        Self::with_timer(ManualFlush, crate::timer::DEFAULT_FLUSH_INTERVAL)
    }

    pub fn with_timer(timer: impl FlushTimer + 'static, flush_interval: Duration) -> Self {
        Self {
            state: TrackerState::new(),
            pending: Vec::new(),
            enabled: true,
            timer_armed: false,
            flush_interval,
            timer: Box::new(timer),
            observers: Vec::new(),
        }
    }

    /// Mutex-guarded tracker that flushes itself from a tokio task
    /// `flush_interval` after the first pending update.
    pub fn new_shared(flush_interval: Duration) -> SharedTracker {
        Arc::new_cyclic(|weak| {
            Mutex::new(Self::with_timer(
                TokioFlushTimer::new(weak.clone()),
                flush_interval,
            ))
        })
    }

    pub fn add_observer<O: TrackerObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabled trackers ignore create/start/end but keep what they have.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            tracing::debug!(enabled, "Job tracking toggled");
        }
        self.enabled = enabled;
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    /// Number of queued `(row, parent)` updates not yet flushed.
    pub fn pending_updates(&self) -> usize {
        self.pending.len()
    }

    /// Record a new job `job` in `session`, optionally under `parent_job`.
    pub fn create(
        &mut self,
        session: &str,
        job: &str,
        parent_job: &str,
        job_type: &str,
        debug_info: &str,
    ) {
        if !self.enabled || session.is_empty() || job.is_empty() {
            return;
        }

        if !parent_job.is_empty() && !self.state.name_to_id.contains_key(parent_job) {
            tracing::warn!(
                session,
                job,
                parent_job,
                "Job announced before its parent, adding placeholder parent"
            );
            self.create(session, parent_job, "", PLACEHOLDER_JOB_TYPE, PLACEHOLDER_DEBUG_INFO);
        }

        let session_id = match self.state.session_id(session) {
            Some(id) => id,
            None => self.add_session(session),
        };

        let parent = if parent_job.is_empty() {
            session_id
        } else {
            match self.state.name_to_id.get(parent_job) {
                Some(&id) => NodeId::Job(id),
                None => session_id,
            }
        };

        if let Some(previous) = self.state.job_id(job).and_then(|id| self.state.job(id)) {
            if previous.state == JobState::Running {
                tracing::warn!(
                    session,
                    job,
                    previous_id = previous.id,
                    "Job name reused while the previous job is still running"
                );
            }
        }

        let pos = self.state.child_count(parent);
        self.emit(TrackerEvent::AboutToAdd { pos, parent });

        let id = self.state.next_id;
        self.state.next_id += 1;
        self.state
            .jobs
            .insert(id, JobInfo::new(id, job, parent, job_type, debug_info));
        self.state.name_to_id.insert(job.to_string(), id);
        self.state.children.entry(parent).or_default().push(id);

        self.emit(TrackerEvent::Added { pos, parent });
    }

    /// Mark `job` as running.
    pub fn start(&mut self, job: &str) {
        if !self.enabled {
            return;
        }
        let Some(id) = self.state.job_id(job) else {
            tracing::debug!(job, "Start for unknown job ignored");
            return;
        };
        let Some(info) = self.state.jobs.get_mut(&id) else {
            return;
        };
        info.state = JobState::Running;
        info.started_at = Some(Utc::now());
        let parent = info.parent;
        self.queue_update(id, parent);
    }

    /// Mark `job` as ended, or failed when `error` is non-empty.
    pub fn end(&mut self, job: &str, error: &str) {
        if !self.enabled {
            return;
        }
        let Some(id) = self.state.job_id(job) else {
            tracing::debug!(job, "End for unknown job ignored");
            return;
        };
        let Some(info) = self.state.jobs.get_mut(&id) else {
            return;
        };
        if error.is_empty() {
            info.state = JobState::Ended;
        } else {
            info.state = JobState::Failed;
            info.error = error.to_string();
        }
        info.ended_at = Some(Utc::now());
        let parent = info.parent;
        self.queue_update(id, parent);
    }

    /// Deliver queued state changes as a single `Updated` batch.
    pub fn flush(&mut self) {
        if self.timer_armed {
            self.timer.cancel();
        }
        self.timer_armed = false;
        if self.pending.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.pending);
        self.emit(TrackerEvent::Updated(batch));
    }

    /// Drop every session, job and pending update.
    ///
    /// The id counter keeps running, so ids seen before a clear are never
    /// handed out again by this tracker.
    pub fn clear(&mut self) {
        self.state.clear();
        self.pending.clear();
        self.timer.cancel();
        self.timer_armed = false;
    }

    /// [`clear`](Self::clear) bracketed by `AboutToReset` / `Reset`.
    pub fn reset(&mut self) {
        self.emit(TrackerEvent::AboutToReset);
        self.clear();
        self.emit(TrackerEvent::Reset);
        tracing::info!("Job tracker reset");
    }

    fn add_session(&mut self, session: &str) -> NodeId {
        let pos = self.state.sessions.len();
        self.emit(TrackerEvent::AboutToAdd {
            pos,
            parent: NodeId::Root,
        });
        self.state.sessions.push(session.to_string());
        self.state.session_rows.insert(session.to_string(), pos);
        self.emit(TrackerEvent::Added {
            pos,
            parent: NodeId::Root,
        });
        NodeId::Session(pos)
    }

    fn queue_update(&mut self, id: JobId, parent: NodeId) {
        let Some(row) = self.state.row_for_job(id, parent) else {
            tracing::error!(job_id = id, ?parent, "Job missing from its parent's child list");
            return;
        };
        self.pending.push((row, parent));
        if !self.timer_armed && self.enabled {
            self.timer_armed = true;
            self.timer.arm(self.flush_interval);
        }
    }

    fn emit(&mut self, event: TrackerEvent) {
        for observer in &mut self.observers {
            observer.on_event(&self.state, &event);
        }
    }
}

impl Default for EventTracker {
    fn default() -> Self {
        Self::new()
    }
}

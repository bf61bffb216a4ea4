// crates/core/src/lib.rs
//! Job tracker core for the PIM console.
//!
//! - `EventTracker` — ingests create/start/end events into a session → job tree
//! - `TreeProjection` — row/column view of that tree for presentation layers
//! - `ProjectionObserver` — turns tracker notifications into `ModelEvent`s
//! - `FlushTimer` — debounce hook used to coalesce state-change notifications

pub mod error;
pub mod format;
pub mod ids;
pub mod projection;
pub mod timer;
pub mod tracker;
pub mod types;

pub use error::*;
pub use ids::{JobId, NodeId, FIRST_JOB_ID, ROOT_RAW_ID};
pub use projection::{
    Aspect, CellValue, Column, ModelEvent, ModelIndex, ProjectionObserver, RowSnapshot,
    RowStyle, TreeProjection,
};
pub use timer::{FlushTimer, ManualFlush, TokioFlushTimer, DEFAULT_FLUSH_INTERVAL};
pub use tracker::{
    EventTracker, SharedTracker, TrackerEvent, TrackerObserver, TrackerState,
    PLACEHOLDER_DEBUG_INFO, PLACEHOLDER_JOB_TYPE,
};
pub use types::{JobInfo, JobState, SessionSummary};

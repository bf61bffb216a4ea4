// crates/core/src/ids.rs
//! Node identifiers for the session → job tree.
//!
//! Event sources and older consumers know these as plain signed integers:
//! `-1` for the root, `-(index + 2)` for sessions and `>= 42` for jobs.
//! Internally the three kinds are kept apart by [`NodeId`]; the numeric form
//! only exists at the edges via [`NodeId::raw`] / [`NodeId::from_raw`].

use serde::{Deserialize, Serialize};

/// Synthetic job identifier, unique for the lifetime of a tracker.
pub type JobId = u64;

/// First id handed out to a job.
pub const FIRST_JOB_ID: JobId = 42;

/// Numeric form of [`NodeId::Root`].
pub const ROOT_RAW_ID: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum NodeId {
    /// Invisible parent of all sessions.
    Root,
    /// Session by position in first-appearance order.
    Session(usize),
    /// Job by synthetic id.
    Job(JobId),
}

impl NodeId {
    pub fn raw(self) -> i64 {
        match self {
            NodeId::Root => ROOT_RAW_ID,
            NodeId::Session(index) => -(index as i64 + 2),
            NodeId::Job(id) => id as i64,
        }
    }

    /// `None` for values with no session index on this platform.
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            ROOT_RAW_ID => Some(NodeId::Root),
            r if r < ROOT_RAW_ID => r
                .checked_neg()
                .and_then(|n| n.checked_sub(2))
                .and_then(|index| usize::try_from(index).ok())
                .map(NodeId::Session),
            r => Some(NodeId::Job(r as JobId)),
        }
    }

    pub fn is_root(self) -> bool {
        matches!(self, NodeId::Root)
    }

    pub fn as_job(self) -> Option<JobId> {
        match self {
            NodeId::Job(id) => Some(id),
            _ => None,
        }
    }
}

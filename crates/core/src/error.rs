// crates/core/src/error.rs
use thiserror::Error;

use crate::ids::{JobId, NodeId};

/// Errors reported by tracker queries.
///
/// Ingestion (`create`/`start`/`end`) never fails; these only surface when a
/// caller asks about an id the tracker did not hand out, which points at a
/// bookkeeping bug rather than bad input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Unknown job id: {id}")]
    UnknownJob { id: JobId },

    #[error("Unknown session: {name}")]
    UnknownSession { name: String },

    #[error("Job {id} is not a child of {parent:?}")]
    NotAChild { id: JobId, parent: NodeId },
}

impl TrackerError {
    pub fn unknown_job(id: JobId) -> Self {
        Self::UnknownJob { id }
    }

    pub fn unknown_session(name: impl Into<String>) -> Self {
        Self::UnknownSession { name: name.into() }
    }
}

// crates/core/src/types.rs
//! Job records held by the tracker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{JobId, NodeId};

/// Lifecycle state of a tracked job.
///
/// `Initial → Running → {Ended, Failed}`; every transition comes from the
/// event source, the tracker never advances a job on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Initial,
    Running,
    Ended,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Ended | JobState::Failed)
    }
}

/// Everything the tracker knows about one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub id: JobId,
    pub name: String,
    pub parent: NodeId,
    pub state: JobState,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub job_type: String,
    pub debug_info: String,
    /// Only set when `state` is `Failed`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl JobInfo {
    pub fn new(
        id: JobId,
        name: impl Into<String>,
        parent: NodeId,
        job_type: impl Into<String>,
        debug_info: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            parent,
            state: JobState::Initial,
            created_at: Some(Utc::now()),
            started_at: None,
            ended_at: None,
            job_type: job_type.into(),
            debug_info: debug_info.into(),
            error: String::new(),
        }
    }

    /// Human-readable state, as shown in the state column.
    pub fn state_label(&self) -> String {
        match self.state {
            JobState::Initial => "Waiting".into(),
            JobState::Running => "Running".into(),
            JobState::Ended => "Ended".into(),
            JobState::Failed => format!("Failed: {}", self.error),
        }
    }

    /// Time spent queued before the job started.
    pub fn wait_time(&self) -> Option<chrono::Duration> {
        Some(self.started_at? - self.created_at?)
    }

    /// Time between start and end.
    pub fn run_time(&self) -> Option<chrono::Duration> {
        Some(self.ended_at? - self.started_at?)
    }
}

/// Session overview for list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub name: String,
    /// Numeric id (`-(row + 2)`).
    pub id: i64,
    pub row: usize,
    pub job_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn job() -> JobInfo {
        JobInfo::new(42, "job1", NodeId::Session(0), "type1", "dbg1")
    }

    #[test]
    fn test_new_job_is_waiting() {
        let info = job();
        assert_eq!(info.state, JobState::Initial);
        assert!(info.created_at.is_some());
        assert!(info.started_at.is_none());
        assert_eq!(info.state_label(), "Waiting");
    }

    #[test]
    fn test_state_labels() {
        let mut info = job();
        info.state = JobState::Running;
        assert_eq!(info.state_label(), "Running");
        info.state = JobState::Ended;
        assert_eq!(info.state_label(), "Ended");
        info.state = JobState::Failed;
        info.error = "connection refused".into();
        assert_eq!(info.state_label(), "Failed: connection refused");
    }

    #[test]
    fn test_wait_and_run_time() {
        let mut info = job();
        info.created_at = Some(Utc.with_ymd_and_hms(2026, 2, 5, 12, 0, 0).unwrap());
        assert!(info.wait_time().is_none());
        assert!(info.run_time().is_none());

        info.started_at = Some(Utc.with_ymd_and_hms(2026, 2, 5, 12, 0, 2).unwrap());
        assert_eq!(info.wait_time(), Some(chrono::Duration::seconds(2)));
        assert!(info.run_time().is_none());

        info.ended_at = Some(Utc.with_ymd_and_hms(2026, 2, 5, 12, 0, 7).unwrap());
        assert_eq!(info.run_time(), Some(chrono::Duration::seconds(5)));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Initial.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Ended.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }

    #[test]
    fn test_job_info_serialize() {
        let info = job();
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"jobType\":\"type1\""));
        assert!(json.contains("\"debugInfo\":\"dbg1\""));
        assert!(json.contains("\"state\":\"initial\""));
        assert!(!json.contains("\"error\""));
    }
}

// crates/core/src/projection.rs
//! Row/column view of the tracker for tree-displaying front ends.
//!
//! Sessions are the top-level rows; each row under a column-0 node is one
//! child job. Nothing is cached here: every query (including a node's own
//! row when computing a parent) goes back to [`TrackerState`], so there is no
//! row cache to invalidate when jobs are added.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::format::{format_duration, format_time};
use crate::ids::NodeId;
use crate::tracker::{TrackerEvent, TrackerObserver, TrackerState};
use crate::types::{JobInfo, JobState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Name = 0,
    Created = 1,
    WaitTime = 2,
    Duration = 3,
    JobType = 4,
    State = 5,
    Info = 6,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Name,
        Column::Created,
        Column::WaitTime,
        Column::Duration,
        Column::JobType,
        Column::State,
        Column::Info,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn header(self) -> &'static str {
        match self {
            Column::Name => "Job ID",
            Column::Created => "Created",
            Column::WaitTime => "Wait time",
            Column::Duration => "Job duration",
            Column::JobType => "Job type",
            Column::State => "State",
            Column::Info => "Info",
        }
    }
}

/// Address of one cell. `None` stands for the invisible root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelIndex {
    pub row: usize,
    pub column: usize,
    pub id: NodeId,
}

impl ModelIndex {
    pub fn sibling(self, column: usize) -> Self {
        Self { column, ..self }
    }
}

/// Which facet of a cell to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aspect {
    Display,
    ToolTip,
    Style,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStyle {
    #[default]
    Normal,
    /// Job is running.
    Emphasized,
    /// Job failed.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Style(RowStyle),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            CellValue::Style(_) => None,
        }
    }
}

/// Structural and data-change notifications, in the order a tree view
/// expects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ModelEvent {
    RowsAboutToBeInserted {
        parent: Option<ModelIndex>,
        first: usize,
        last: usize,
    },
    RowsInserted {
        parent: Option<ModelIndex>,
        first: usize,
        last: usize,
    },
    DataChanged {
        top_left: ModelIndex,
        bottom_right: ModelIndex,
    },
    ModelAboutToBeReset,
    ModelReset,
}

/// One rendered row of [`TreeProjection::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSnapshot {
    pub id: i64,
    pub row: usize,
    pub cells: Vec<String>,
    pub style: RowStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RowSnapshot>,
}

/// Read-only tree view over a borrowed tracker state.
#[derive(Clone, Copy)]
pub struct TreeProjection<'a> {
    tracker: &'a TrackerState,
}

impl<'a> TreeProjection<'a> {
    pub fn new(tracker: &'a TrackerState) -> Self {
        Self { tracker }
    }

    pub fn column_count(&self) -> usize {
        Column::COUNT
    }

    pub fn header(&self, column: usize) -> Option<&'static str> {
        Column::from_index(column).map(Column::header)
    }

    pub fn index(&self, row: usize, column: usize, parent: Option<&ModelIndex>) -> Option<ModelIndex> {
        if column >= Column::COUNT {
            return None;
        }
        let id = match parent {
            None => {
                if row >= self.tracker.session_count() {
                    return None;
                }
                NodeId::Session(row)
            }
            Some(parent) if parent.column == 0 => {
                NodeId::Job(*self.tracker.children(parent.id).get(row)?)
            }
            Some(_) => return None,
        };
        Some(ModelIndex { row, column, id })
    }

    pub fn parent(&self, index: &ModelIndex) -> Option<ModelIndex> {
        self.node_index(self.tracker.parent_for(index.id))
    }

    pub fn row_count(&self, parent: Option<&ModelIndex>) -> usize {
        match parent {
            None => self.tracker.session_count(),
            Some(parent) if parent.column == 0 => self.tracker.child_count(parent.id),
            Some(_) => 0,
        }
    }

    pub fn has_children(&self, parent: Option<&ModelIndex>) -> bool {
        self.row_count(parent) > 0
    }

    /// Column-0 index of `id`, with its row looked up from the tracker.
    /// `None` for the root and for ids that are not in the tree.
    pub fn node_index(&self, id: NodeId) -> Option<ModelIndex> {
        let row = match id {
            NodeId::Root => return None,
            NodeId::Session(_) => {
                let name = self.tracker.session_name(id)?;
                match self.tracker.session_id(name)? {
                    NodeId::Session(row) => row,
                    _ => return None,
                }
            }
            NodeId::Job(job) => {
                let grandparent = self.tracker.parent_for(id);
                self.tracker.row_for_job(job, grandparent)?
            }
        };
        Some(ModelIndex { row, column: 0, id })
    }

    pub fn data(&self, index: &ModelIndex, aspect: Aspect) -> Option<CellValue> {
        match index.id {
            NodeId::Root => None,
            NodeId::Session(_) => match (aspect, index.column) {
                (Aspect::Display, 0) => self
                    .tracker
                    .session_name(index.id)
                    .map(|name| CellValue::Text(name.to_string())),
                _ => None,
            },
            NodeId::Job(id) => {
                let info = self.tracker.info(id).ok()?;
                match aspect {
                    Aspect::Display => {
                        Column::from_index(index.column).map(|c| CellValue::Text(job_cell(info, c)))
                    }
                    Aspect::Style => Some(CellValue::Style(job_style(info))),
                    Aspect::ToolTip => (info.state == JobState::Failed)
                        .then(|| CellValue::Text(info.error.clone())),
                }
            }
        }
    }

    /// Whole tree rendered to display text, sessions first.
    pub fn snapshot(&self) -> Vec<RowSnapshot> {
        self.snapshot_rows(None)
    }

    fn snapshot_rows(&self, parent: Option<&ModelIndex>) -> Vec<RowSnapshot> {
        (0..self.row_count(parent))
            .filter_map(|row| self.index(row, 0, parent))
            .map(|index| {
                let cells = (0..self.column_count())
                    .map(|column| {
                        self.data(&index.sibling(column), Aspect::Display)
                            .and_then(|v| v.as_text().map(str::to_string))
                            .unwrap_or_default()
                    })
                    .collect();
                let style = match self.data(&index, Aspect::Style) {
                    Some(CellValue::Style(style)) => style,
                    _ => RowStyle::Normal,
                };
                let tooltip = self
                    .data(&index, Aspect::ToolTip)
                    .and_then(|v| v.as_text().map(str::to_string));
                RowSnapshot {
                    id: index.id.raw(),
                    row: index.row,
                    cells,
                    style,
                    tooltip,
                    children: self.snapshot_rows(Some(&index)),
                }
            })
            .collect()
    }
}

fn job_cell(info: &JobInfo, column: Column) -> String {
    match column {
        Column::Name => info.name.clone(),
        Column::Created => info.created_at.map(format_time).unwrap_or_default(),
        Column::WaitTime => info.wait_time().map(format_duration).unwrap_or_default(),
        Column::Duration => info.run_time().map(format_duration).unwrap_or_default(),
        Column::JobType => info.job_type.clone(),
        Column::State => info.state_label(),
        Column::Info => info.debug_info.clone(),
    }
}

fn job_style(info: &JobInfo) -> RowStyle {
    match info.state {
        JobState::Running => RowStyle::Emphasized,
        JobState::Failed => RowStyle::Error,
        JobState::Initial | JobState::Ended => RowStyle::Normal,
    }
}

/// Tracker observer that republishes tracker notifications as
/// [`ModelEvent`]s on a broadcast channel.
#[derive(Clone)]
pub struct ProjectionObserver {
    tx: broadcast::Sender<ModelEvent>,
}

impl ProjectionObserver {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.tx.subscribe()
    }

    fn send(&self, event: ModelEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }

    fn resolve_parent(model: &TreeProjection<'_>, parent: NodeId) -> Option<Option<ModelIndex>> {
        if parent.is_root() {
            return Some(None);
        }
        match model.node_index(parent) {
            Some(index) => Some(Some(index)),
            None => {
                tracing::error!(?parent, "Notification for a parent that is not in the tree");
                None
            }
        }
    }
}

impl TrackerObserver for ProjectionObserver {
    fn on_event(&mut self, state: &TrackerState, event: &TrackerEvent) {
        let model = TreeProjection::new(state);
        match event {
            TrackerEvent::AboutToAdd { pos, parent } => {
                if let Some(parent) = Self::resolve_parent(&model, *parent) {
                    self.send(ModelEvent::RowsAboutToBeInserted {
                        parent,
                        first: *pos,
                        last: *pos,
                    });
                }
            }
            TrackerEvent::Added { pos, parent } => {
                if let Some(parent) = Self::resolve_parent(&model, *parent) {
                    self.send(ModelEvent::RowsInserted {
                        parent,
                        first: *pos,
                        last: *pos,
                    });
                }
            }
            TrackerEvent::Updated(batch) => {
                for &(row, parent) in batch {
                    let Some(parent) = Self::resolve_parent(&model, parent) else {
                        continue;
                    };
                    let top_left = model.index(row, 0, parent.as_ref());
                    let bottom_right = model.index(row, Column::COUNT - 1, parent.as_ref());
                    match (top_left, bottom_right) {
                        (Some(top_left), Some(bottom_right)) => {
                            self.send(ModelEvent::DataChanged {
                                top_left,
                                bottom_right,
                            });
                        }
                        _ => tracing::debug!(row, "Update for a row that no longer exists"),
                    }
                }
            }
            TrackerEvent::AboutToReset => self.send(ModelEvent::ModelAboutToBeReset),
            TrackerEvent::Reset => self.send(ModelEvent::ModelReset),
        }
    }
}

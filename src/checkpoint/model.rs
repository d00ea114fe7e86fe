//! Checkpoint record and lifecycle status

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle of one feature run: `Pending -> InProgress -> Completed | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl CheckpointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Completed and Failed end a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for CheckpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted progress of one feature's run.
///
/// The id equals the feature id, so each feature has a single checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub feature_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: CheckpointStatus,
    /// Append-only, in execution order
    #[serde(default)]
    pub completed_workstreams: Vec<String>,
    /// Workstream in flight, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_workstream: Option<String>,
    /// Caller data, round-tripped untouched
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Checkpoint {
    /// Fresh `Pending` checkpoint for a feature
    pub fn new(feature_id: impl Into<String>) -> Self {
        let feature_id = feature_id.into();
        let now = Utc::now();
        Self {
            id: feature_id.clone(),
            feature_id,
            created_at: now,
            updated_at: now,
            status: CheckpointStatus::Pending,
            completed_workstreams: Vec::new(),
            current_workstream: None,
            metadata: Map::new(),
        }
    }

    pub fn is_completed(&self, ws_id: &str) -> bool {
        self.completed_workstreams.iter().any(|id| id == ws_id)
    }

    /// Refresh `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Mark a workstream as in flight
    pub(crate) fn start_workstream(&mut self, ws_id: &str) {
        self.current_workstream = Some(ws_id.to_string());
        self.status = CheckpointStatus::InProgress;
        self.touch();
    }

    /// Record a successful workstream
    pub(crate) fn complete_workstream(&mut self, ws_id: &str) {
        if !self.is_completed(ws_id) {
            self.completed_workstreams.push(ws_id.to_string());
        }
        self.touch();
    }

    pub(crate) fn mark_failed(&mut self) {
        self.status = CheckpointStatus::Failed;
        self.touch();
    }

    pub(crate) fn mark_completed(&mut self) {
        self.status = CheckpointStatus::Completed;
        self.current_workstream = None;
        self.touch();
    }
}

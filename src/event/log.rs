//! EventLog - append-only record of orchestration events
//!
//! - Event: envelope with id + timestamp + kind
//! - EventKind: feature-level and workstream-level variants
//! - EventLog: thread-safe, append-only log

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single event in the orchestration log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence ID (for ordering)
    pub id: u64,
    /// Time since log creation (ms)
    pub timestamp_ms: u64,
    /// Event type and data
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // ═══════════════════════════════════════════
    // FEATURE LEVEL
    // ═══════════════════════════════════════════
    FeatureStarted {
        feature_id: String,
        correlation_id: String,
        /// True when continuing from an existing checkpoint
        resumed: bool,
    },
    GraphBuilt {
        feature_id: String,
        nodes: usize,
        edges: usize,
        duration_ms: u64,
    },
    /// Workstreams that will run, in order
    ExecutionPlanned {
        feature_id: String,
        order: Vec<String>,
    },
    FeatureCompleted {
        feature_id: String,
        completed: usize,
        total_duration_ms: u64,
    },
    FeatureFailed {
        feature_id: String,
        error: String,
        failed_workstream: Option<String>,
    },

    // ═══════════════════════════════════════════
    // WORKSTREAM LEVEL
    // ═══════════════════════════════════════════
    WorkstreamStarted {
        ws_id: String,
        /// 1-based position in this run
        index: usize,
        total: usize,
    },
    WorkstreamRetrying {
        ws_id: String,
        /// Attempt about to run (2 = first retry)
        attempt: u32,
        max_attempts: u32,
        error: String,
    },
    WorkstreamCompleted {
        ws_id: String,
        attempts: u32,
        duration_ms: u64,
    },
    WorkstreamFailed {
        ws_id: String,
        attempts: u32,
        error: String,
    },
    CheckpointSaved {
        checkpoint_id: String,
        status: String,
        completed: usize,
    },
}

impl EventKind {
    /// Workstream id for workstream-level events
    pub fn ws_id(&self) -> Option<&str> {
        match self {
            Self::WorkstreamStarted { ws_id, .. }
            | Self::WorkstreamRetrying { ws_id, .. }
            | Self::WorkstreamCompleted { ws_id, .. }
            | Self::WorkstreamFailed { ws_id, .. } => Some(ws_id),
            Self::FeatureStarted { .. }
            | Self::GraphBuilt { .. }
            | Self::ExecutionPlanned { .. }
            | Self::FeatureCompleted { .. }
            | Self::FeatureFailed { .. }
            | Self::CheckpointSaved { .. } => None,
        }
    }

    pub fn is_feature_event(&self) -> bool {
        matches!(
            self,
            Self::FeatureStarted { .. }
                | Self::FeatureCompleted { .. }
                | Self::FeatureFailed { .. }
        )
    }
}

/// Thread-safe, append-only event log
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<Vec<Event>>>,
    start_time: Instant,
    next_id: Arc<AtomicU64>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            start_time: Instant::now(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event (thread-safe, returns event ID)
    pub fn emit(&self, kind: EventKind) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            id,
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            kind,
        };

        self.events.write().push(event);
        id
    }

    /// Get all events (cloned - use `with_events` for zero-copy access)
    pub fn events(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    /// Zero-copy access to events via callback
    ///
    /// Holds read lock for duration of callback - keep it short.
    pub fn with_events<T>(&self, f: impl FnOnce(&[Event]) -> T) -> T {
        f(&self.events.read())
    }

    /// Events for one workstream, in order
    pub fn filter_workstream(&self, ws_id: &str) -> Vec<Event> {
        self.with_events(|events| {
            events
                .iter()
                .filter(|e| e.kind.ws_id() == Some(ws_id))
                .cloned()
                .collect()
        })
    }

    pub fn feature_events(&self) -> Vec<Event> {
        self.with_events(|events| {
            events
                .iter()
                .filter(|e| e.kind.is_feature_event())
                .cloned()
                .collect()
        })
    }

    /// Serialize to JSON for persistence/debugging
    pub fn to_json(&self) -> Value {
        self.with_events(|events| serde_json::to_value(events).unwrap_or(Value::Null))
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

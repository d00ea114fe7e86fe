//! Progress reporting on top of the engine
//!
//! `ProgressReporter` turns engine events into timestamped status lines
//! (`[HH:MM] Executing ws-2 (2/3)...`). `FeatureCoordinator` wires a
//! reporter into an `Orchestrator` and adds a fixed delay between retries.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;

use super::orchestrator::Orchestrator;
use super::retry::{Backoff, RetryPolicy};
use crate::checkpoint::Checkpoint;
use crate::error::Result;
use crate::event::{EventEmitter, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Started,
    GraphBuilt,
    ExecutionOrder,
    Executing,
    Retrying,
    Completed,
    Failed,
    FeatureCompleted,
    FeatureFailed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::GraphBuilt => "graph_built",
            Self::ExecutionOrder => "execution_order",
            Self::Executing => "executing",
            Self::Retrying => "retrying",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::FeatureCompleted => "feature_completed",
            Self::FeatureFailed => "feature_failed",
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One human-readable status line
#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub ws_id: Option<String>,
    pub status: ProgressStatus,
}

pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

fn seconds(ms: u64) -> String {
    format!("{:.1}s", ms as f64 / 1000.0)
}

/// Event emitter that relays progress lines to a callback.
///
/// Events are forwarded to an optional inner emitter first.
pub struct ProgressReporter {
    callback: ProgressCallback,
    inner: Option<Arc<dyn EventEmitter>>,
}

impl ProgressReporter {
    pub fn new(callback: impl Fn(ProgressUpdate) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
            inner: None,
        }
    }

    pub fn with_inner(mut self, inner: Arc<dyn EventEmitter>) -> Self {
        self.inner = Some(inner);
        self
    }

    /// Status line for an event; `None` for events not shown to users
    pub fn describe(kind: &EventKind) -> Option<(String, Option<String>, ProgressStatus)> {
        let line = match kind {
            EventKind::FeatureStarted {
                feature_id,
                resumed,
                ..
            } => {
                let verb = if *resumed { "Resuming" } else { "Starting" };
                (
                    format!("{verb} feature execution: {feature_id}"),
                    None,
                    ProgressStatus::Started,
                )
            }
            EventKind::GraphBuilt { nodes, edges, .. } => (
                format!("Dependency graph built: {nodes} workstreams, {edges} dependencies"),
                None,
                ProgressStatus::GraphBuilt,
            ),
            EventKind::ExecutionPlanned { order, .. } => (
                format!("Execution order: [{}]", order.join(", ")),
                None,
                ProgressStatus::ExecutionOrder,
            ),
            EventKind::WorkstreamStarted {
                ws_id,
                index,
                total,
            } => (
                format!("Executing {ws_id} ({index}/{total})..."),
                Some(ws_id.clone()),
                ProgressStatus::Executing,
            ),
            EventKind::WorkstreamRetrying {
                ws_id,
                attempt,
                max_attempts,
                ..
            } => (
                format!(
                    "{ws_id} failed (attempt {}/{max_attempts}), retrying...",
                    attempt.saturating_sub(1)
                ),
                Some(ws_id.clone()),
                ProgressStatus::Retrying,
            ),
            EventKind::WorkstreamCompleted {
                ws_id, duration_ms, ..
            } => (
                format!("{ws_id} complete ({})", seconds(*duration_ms)),
                Some(ws_id.clone()),
                ProgressStatus::Completed,
            ),
            EventKind::WorkstreamFailed {
                ws_id,
                attempts,
                error,
            } => (
                format!("{ws_id} failed after {attempts} attempt(s): {error}"),
                Some(ws_id.clone()),
                ProgressStatus::Failed,
            ),
            EventKind::FeatureCompleted {
                completed,
                total_duration_ms,
                ..
            } => (
                format!(
                    "Feature execution complete: {completed}/{completed} workstreams, {} total",
                    seconds(*total_duration_ms)
                ),
                None,
                ProgressStatus::FeatureCompleted,
            ),
            EventKind::FeatureFailed { error, .. } => (
                format!("Feature execution failed: {error}"),
                None,
                ProgressStatus::FeatureFailed,
            ),
            EventKind::CheckpointSaved { .. } => return None,
        };
        Some(line)
    }
}

impl EventEmitter for ProgressReporter {
    fn emit(&self, kind: EventKind) -> u64 {
        let update = Self::describe(&kind).map(|(message, ws_id, status)| {
            let timestamp = Local::now();
            ProgressUpdate {
                message: format!("[{}] {}", timestamp.format("%H:%M"), message),
                timestamp,
                ws_id,
                status,
            }
        });

        let id = self.inner.as_ref().map_or(0, |inner| inner.emit(kind));
        if let Some(update) = update {
            (self.callback)(update);
        }
        id
    }
}

/// Orchestrator with progress lines and a fixed delay between retries
pub struct FeatureCoordinator {
    orchestrator: Orchestrator,
}

impl FeatureCoordinator {
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

    /// Wrap an orchestrator, keeping its retry policy and existing emitter.
    ///
    /// A policy without backoff gets `DEFAULT_RETRY_DELAY` between attempts.
    pub fn new(
        orchestrator: Orchestrator,
        on_progress: impl Fn(ProgressUpdate) + Send + Sync + 'static,
    ) -> Self {
        let reporter =
            ProgressReporter::new(on_progress).with_inner(Arc::clone(orchestrator.emitter()));
        let current = orchestrator.retry_policy().clone();
        let policy = if *current.backoff() == Backoff::None {
            current.with_backoff(Backoff::Fixed(Self::DEFAULT_RETRY_DELAY))
        } else {
            current
        };

        Self {
            orchestrator: orchestrator
                .with_emitter(Arc::new(reporter))
                .with_retry_policy(policy),
        }
    }

    /// Replace the retry policy as given, including a `Backoff::None` one
    pub fn with_retry_policy(self, policy: RetryPolicy) -> Self {
        Self {
            orchestrator: self.orchestrator.with_retry_policy(policy),
        }
    }

    /// Replace the delay between retries
    pub fn with_retry_delay(self, delay: Duration) -> Self {
        let backoff = if delay.is_zero() {
            Backoff::None
        } else {
            Backoff::Fixed(delay)
        };
        let policy = self.orchestrator.retry_policy().clone().with_backoff(backoff);
        self.with_retry_policy(policy)
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub async fn execute_feature(&self, feature_id: &str) -> Result<Checkpoint> {
        self.orchestrator.run(feature_id).await
    }

    pub async fn resume_feature(&self, checkpoint_id: &str) -> Result<Checkpoint> {
        self.orchestrator.resume(checkpoint_id).await
    }
}

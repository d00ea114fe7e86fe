//! Orchestrator - checkpointed sequential execution of a feature
//!
//! Per run: load workstreams, build and sort the dependency graph, then
//! execute one workstream at a time in topological order. The checkpoint
//! is persisted before and after every workstream:
//!
//! ```text
//! Pending ──▶ InProgress ──▶ Completed
//!                  │
//!                  └──────▶ Failed
//! ```
//!
//! Independent branches are not run concurrently. Keeping one workstream
//! in flight lets the checkpoint describe progress with a single
//! `current_workstream` and keeps resume a simple slice of the full order.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, instrument, warn, Span};
use uuid::Uuid;

use super::retry::{RetryExhausted, RetryPolicy};
use crate::checkpoint::{Checkpoint, CheckpointStatus, CheckpointStore};
use crate::dag::{topological_sort, DependencyGraph};
use crate::error::{Result, SdpError};
use crate::event::{EventEmitter, EventKind, NoopEmitter};
use crate::slo::SloTracker;
use crate::workstream::{WorkstreamExecutor, WorkstreamSource};

/// Workstreams still to run for a checkpoint.
///
/// Slices the full order from `current_workstream` (start when unset or
/// unknown) and drops anything already completed. A workstream that failed
/// without completing is therefore run again.
pub fn remaining_workstreams(order: &[String], checkpoint: &Checkpoint) -> Vec<String> {
    if checkpoint.status == CheckpointStatus::Completed {
        return Vec::new();
    }

    let start = checkpoint
        .current_workstream
        .as_deref()
        .and_then(|current| order.iter().position(|id| id == current))
        .unwrap_or(0);

    order[start..]
        .iter()
        .filter(|id| !checkpoint.is_completed(id))
        .cloned()
        .collect()
}

/// Feature execution engine
pub struct Orchestrator {
    source: Arc<dyn WorkstreamSource>,
    executor: Arc<dyn WorkstreamExecutor>,
    store: Arc<dyn CheckpointStore>,
    retry: RetryPolicy,
    emitter: Arc<dyn EventEmitter>,
    slo: Option<Arc<SloTracker>>,
}

impl Orchestrator {
    /// Engine with `max_retries` immediate retries per workstream
    pub fn new(
        source: Arc<dyn WorkstreamSource>,
        executor: Arc<dyn WorkstreamExecutor>,
        store: Arc<dyn CheckpointStore>,
        max_retries: u32,
    ) -> Self {
        Self {
            source,
            executor,
            store,
            retry: RetryPolicy::new(max_retries),
            emitter: Arc::new(NoopEmitter),
            slo: None,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn with_slo_tracker(mut self, tracker: Arc<SloTracker>) -> Self {
        self.slo = Some(tracker);
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn emitter(&self) -> &Arc<dyn EventEmitter> {
        &self.emitter
    }

    pub fn slo_tracker(&self) -> Option<&Arc<SloTracker>> {
        self.slo.as_ref()
    }

    /// Execution order for a feature, without running anything
    pub async fn plan(&self, feature_id: &str) -> Result<Vec<String>> {
        self.execution_order(feature_id).await
    }

    /// Run every workstream of a feature from a fresh checkpoint
    #[instrument(skip(self), fields(correlation_id = tracing::field::Empty))]
    pub async fn run(&self, feature_id: &str) -> Result<Checkpoint> {
        let started = Instant::now();
        let correlation_id = Uuid::new_v4().to_string();
        Span::current().record("correlation_id", correlation_id.as_str());

        info!(feature_id, "orchestration started");
        self.emitter.emit(EventKind::FeatureStarted {
            feature_id: feature_id.to_string(),
            correlation_id,
            resumed: false,
        });

        let result = self.run_fresh(feature_id).await;
        self.report(feature_id, started, result)
    }

    async fn run_fresh(&self, feature_id: &str) -> Result<Checkpoint> {
        let order = self.execution_order(feature_id).await?;
        let mut checkpoint = Checkpoint::new(feature_id);
        self.execute_with_checkpoint(&order, &mut checkpoint).await?;
        Ok(checkpoint)
    }

    /// Continue a feature from its persisted checkpoint.
    ///
    /// A completed checkpoint is returned as-is without executing anything.
    #[instrument(skip(self), fields(correlation_id = tracing::field::Empty))]
    pub async fn resume(&self, checkpoint_id: &str) -> Result<Checkpoint> {
        let started = Instant::now();
        let correlation_id = Uuid::new_v4().to_string();
        Span::current().record("correlation_id", correlation_id.as_str());

        let mut checkpoint = match self.store.resume(checkpoint_id).await {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                self.record_recovery(false);
                error!(checkpoint_id, error = %e, "failed to load checkpoint");
                return Err(e);
            }
        };
        let feature_id = checkpoint.feature_id.clone();

        info!(
            feature_id = %feature_id,
            status = %checkpoint.status,
            completed = checkpoint.completed_workstreams.len(),
            "resuming orchestration"
        );
        self.emitter.emit(EventKind::FeatureStarted {
            feature_id: feature_id.clone(),
            correlation_id,
            resumed: true,
        });

        if checkpoint.status == CheckpointStatus::Completed {
            self.record_recovery(true);
            info!(feature_id = %feature_id, "checkpoint already completed, nothing to do");
            return self.report(&feature_id, started, Ok(checkpoint));
        }

        let order = match self.execution_order(&feature_id).await {
            Ok(order) => order,
            Err(e) => {
                self.record_recovery(false);
                return self.report(&feature_id, started, Err(e));
            }
        };
        self.record_recovery(true);

        let remaining = remaining_workstreams(&order, &checkpoint);
        debug!(
            total = order.len(),
            remaining = remaining.len(),
            "computed remaining workstreams"
        );

        let result = self
            .execute_with_checkpoint(&remaining, &mut checkpoint)
            .await
            .map(|()| checkpoint);
        self.report(&feature_id, started, result)
    }

    async fn execution_order(&self, feature_id: &str) -> Result<Vec<String>> {
        let workstreams = self.source.load_workstreams(feature_id).await?;
        if workstreams.is_empty() {
            return Err(SdpError::FeatureNotFound {
                feature_id: feature_id.to_string(),
            });
        }

        let started = Instant::now();
        let planned = DependencyGraph::build(&workstreams)
            .and_then(|graph| topological_sort(&graph).map(|order| (graph, order)));
        let elapsed = started.elapsed();

        // failed builds count towards the latency stream too
        if let Some(slo) = &self.slo {
            slo.record_graph_build(workstreams.len(), elapsed);
        }
        let (graph, order) = planned?;
        info!(
            feature_id,
            nodes = graph.len(),
            edges = graph.edge_count(),
            duration_ms = elapsed.as_millis() as u64,
            "dependency graph built"
        );
        self.emitter.emit(EventKind::GraphBuilt {
            feature_id: feature_id.to_string(),
            nodes: graph.len(),
            edges: graph.edge_count(),
            duration_ms: elapsed.as_millis() as u64,
        });

        Ok(order)
    }

    async fn execute_with_checkpoint(
        &self,
        workstreams: &[String],
        checkpoint: &mut Checkpoint,
    ) -> Result<()> {
        let total = workstreams.len();
        self.emitter.emit(EventKind::ExecutionPlanned {
            feature_id: checkpoint.feature_id.clone(),
            order: workstreams.to_vec(),
        });

        for (index, ws_id) in workstreams.iter().enumerate() {
            checkpoint.start_workstream(ws_id);
            self.save(checkpoint).await?;

            info!(ws_id = %ws_id, index = index + 1, total, "workstream started");
            self.emitter.emit(EventKind::WorkstreamStarted {
                ws_id: ws_id.clone(),
                index: index + 1,
                total,
            });

            let ws_started = Instant::now();
            let outcome = self.execute_with_retry(ws_id).await;
            let elapsed = ws_started.elapsed();
            if let Some(slo) = &self.slo {
                slo.record_ws_execution(ws_id, elapsed);
            }

            match outcome {
                Ok(attempts) => {
                    checkpoint.complete_workstream(ws_id);
                    self.save(checkpoint).await?;

                    info!(
                        ws_id = %ws_id,
                        attempts,
                        duration_ms = elapsed.as_millis() as u64,
                        "workstream complete"
                    );
                    self.emitter.emit(EventKind::WorkstreamCompleted {
                        ws_id: ws_id.clone(),
                        attempts,
                        duration_ms: elapsed.as_millis() as u64,
                    });
                }
                Err(err) => {
                    let attempts = match &err {
                        SdpError::ExecutionFailed { attempts, .. } => *attempts,
                        _ => 0,
                    };
                    error!(ws_id = %ws_id, attempts, error = %err, "workstream failed");
                    self.emitter.emit(EventKind::WorkstreamFailed {
                        ws_id: ws_id.clone(),
                        attempts,
                        error: err.to_string(),
                    });

                    checkpoint.mark_failed();
                    if let Err(save_err) = self.save(checkpoint).await {
                        error!(
                            ws_id = %ws_id,
                            error = %save_err,
                            "failed to persist failed checkpoint"
                        );
                    }
                    return Err(err);
                }
            }
        }

        checkpoint.mark_completed();
        self.save(checkpoint).await
    }

    async fn execute_with_retry(&self, ws_id: &str) -> Result<u32> {
        let executor = &self.executor;
        let max_attempts = self.retry.max_attempts();

        let result = self
            .retry
            .execute(
                move |attempt| {
                    debug!(ws_id, attempt, "executing workstream");
                    executor.execute(ws_id)
                },
                |attempt, err: &anyhow::Error| {
                    warn!(ws_id, attempt, max_attempts, error = %err, "retrying workstream");
                    self.emitter.emit(EventKind::WorkstreamRetrying {
                        ws_id: ws_id.to_string(),
                        attempt,
                        max_attempts,
                        error: err.to_string(),
                    });
                },
            )
            .await;

        match result {
            Ok(((), attempts)) => Ok(attempts),
            Err(RetryExhausted {
                attempts,
                last_error,
            }) => Err(SdpError::ExecutionFailed {
                ws_id: ws_id.to_string(),
                attempts,
                source: last_error.into(),
            }),
        }
    }

    async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let started = Instant::now();
        self.store.save(checkpoint).await?;
        let elapsed = started.elapsed();

        if let Some(slo) = &self.slo {
            slo.record_checkpoint_save(elapsed);
        }
        debug!(
            checkpoint_id = %checkpoint.id,
            status = %checkpoint.status,
            current = checkpoint.current_workstream.as_deref().unwrap_or(""),
            "checkpoint saved"
        );
        self.emitter.emit(EventKind::CheckpointSaved {
            checkpoint_id: checkpoint.id.clone(),
            status: checkpoint.status.to_string(),
            completed: checkpoint.completed_workstreams.len(),
        });
        Ok(())
    }

    fn record_recovery(&self, success: bool) {
        if let Some(slo) = &self.slo {
            slo.record_recovery(success);
        }
    }

    fn report(
        &self,
        feature_id: &str,
        started: Instant,
        result: Result<Checkpoint>,
    ) -> Result<Checkpoint> {
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(checkpoint) => {
                info!(
                    feature_id,
                    duration_ms,
                    total = checkpoint.completed_workstreams.len(),
                    success = true,
                    "orchestration complete"
                );
                self.emitter.emit(EventKind::FeatureCompleted {
                    feature_id: feature_id.to_string(),
                    completed: checkpoint.completed_workstreams.len(),
                    total_duration_ms: duration_ms,
                });
            }
            Err(e) => {
                let failed_workstream = match e {
                    SdpError::ExecutionFailed { ws_id, .. } => Some(ws_id.clone()),
                    _ => None,
                };
                info!(feature_id, duration_ms, success = false, "orchestration complete");
                self.emitter.emit(EventKind::FeatureFailed {
                    feature_id: feature_id.to_string(),
                    error: e.to_string(),
                    failed_workstream,
                });
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemoryCheckpointStore;
    use crate::workstream::{StaticSource, WorkstreamNode};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<String>>,
        fail: Vec<String>,
    }

    #[async_trait]
    impl WorkstreamExecutor for RecordingExecutor {
        async fn execute(&self, ws_id: &str) -> anyhow::Result<()> {
            self.calls.lock().push(ws_id.to_string());
            if self.fail.iter().any(|f| f == ws_id) {
                anyhow::bail!("{ws_id} broke");
            }
            Ok(())
        }
    }

    fn chain() -> Arc<StaticSource> {
        Arc::new(StaticSource::new(vec![
            WorkstreamNode::new("ws-1", "F"),
            WorkstreamNode::new("ws-2", "F").with_prerequisites(["ws-1"]),
            WorkstreamNode::new("ws-3", "F").with_prerequisites(["ws-2"]),
        ]))
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_remaining_from_current() {
        let order = ids(&["a", "b", "c"]);
        let mut cp = Checkpoint::new("F");
        cp.status = CheckpointStatus::InProgress;
        cp.completed_workstreams = ids(&["a"]);
        cp.current_workstream = Some("b".into());
        assert_eq!(remaining_workstreams(&order, &cp), ids(&["b", "c"]));
    }

    #[test]
    fn test_remaining_unknown_current_starts_at_zero() {
        let order = ids(&["a", "b"]);
        let mut cp = Checkpoint::new("F");
        cp.current_workstream = Some("gone".into());
        cp.completed_workstreams = ids(&["a"]);
        assert_eq!(remaining_workstreams(&order, &cp), ids(&["b"]));
    }

    #[test]
    fn test_remaining_completed_is_empty() {
        let mut cp = Checkpoint::new("F");
        cp.status = CheckpointStatus::Completed;
        assert!(remaining_workstreams(&ids(&["a"]), &cp).is_empty());
    }

    #[tokio::test]
    async fn test_run_executes_in_order() {
        let executor = Arc::new(RecordingExecutor::default());
        let store = Arc::new(MemoryCheckpointStore::new());
        let orch = Orchestrator::new(chain(), executor.clone(), store.clone(), 2);

        let cp = orch.run("F").await.unwrap();
        assert_eq!(cp.status, CheckpointStatus::Completed);
        assert_eq!(cp.completed_workstreams, ids(&["ws-1", "ws-2", "ws-3"]));
        assert!(cp.current_workstream.is_none());
        assert_eq!(*executor.calls.lock(), ids(&["ws-1", "ws-2", "ws-3"]));
        // before + after each workstream, plus the final save
        assert_eq!(store.save_count(), 7);
    }

    #[tokio::test]
    async fn test_failure_retries_then_marks_failed() {
        let executor = Arc::new(RecordingExecutor {
            fail: ids(&["ws-2"]),
            ..Default::default()
        });
        let store = Arc::new(MemoryCheckpointStore::new());
        let orch = Orchestrator::new(chain(), executor.clone(), store.clone(), 2);

        let err = orch.run("F").await.unwrap_err();
        match &err {
            SdpError::ExecutionFailed { ws_id, attempts, .. } => {
                assert_eq!(ws_id, "ws-2");
                assert_eq!(*attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*executor.calls.lock(), ids(&["ws-1", "ws-2", "ws-2", "ws-2"]));

        let cp = store.get("F").unwrap();
        assert_eq!(cp.status, CheckpointStatus::Failed);
        assert_eq!(cp.current_workstream.as_deref(), Some("ws-2"));
        assert_eq!(cp.completed_workstreams, ids(&["ws-1"]));
    }
}

//! Shared helpers for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use sdp::checkpoint::{Checkpoint, CheckpointStore, MemoryCheckpointStore};
use sdp::error::{Result, SdpError};
use sdp::workstream::{StaticSource, WorkstreamExecutor, WorkstreamNode};

/// Executor that records every call and fails selected workstreams
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<String>>,
    fail: Vec<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(ids: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl WorkstreamExecutor for RecordingExecutor {
    async fn execute(&self, ws_id: &str) -> anyhow::Result<()> {
        self.calls.lock().push(ws_id.to_string());
        if self.fail.iter().any(|f| f == ws_id) {
            anyhow::bail!("{ws_id} exploded");
        }
        Ok(())
    }
}

/// Store whose saves start failing after `ok_saves` successful writes
pub struct FlakyStore {
    inner: MemoryCheckpointStore,
    ok_saves: usize,
    saves: AtomicUsize,
}

impl FlakyStore {
    pub fn new(ok_saves: usize) -> Self {
        Self {
            inner: MemoryCheckpointStore::new(),
            ok_saves,
            saves: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &MemoryCheckpointStore {
        &self.inner
    }
}

#[async_trait]
impl CheckpointStore for FlakyStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        if self.saves.fetch_add(1, Ordering::SeqCst) >= self.ok_saves {
            return Err(SdpError::CheckpointIo {
                id: checkpoint.id.clone(),
                reason: "disk full".into(),
            });
        }
        self.inner.save(checkpoint).await
    }

    async fn load(&self, id: &str) -> Result<Checkpoint> {
        self.inner.load(id).await
    }
}

pub fn ids(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

/// ws-1 → ws-2 → ws-3 for feature F01
pub fn chain_source() -> Arc<StaticSource> {
    Arc::new(StaticSource::new(vec![
        WorkstreamNode::new("ws-1", "F01"),
        WorkstreamNode::new("ws-2", "F01").with_prerequisites(["ws-1"]),
        WorkstreamNode::new("ws-3", "F01").with_prerequisites(["ws-2"]),
    ]))
}

/// Write a workstream markdown file with front matter
pub fn write_workstream(dir: &Path, ws_id: &str, feature: &str, deps: &[&str]) {
    let deps = if deps.is_empty() {
        "[]".to_string()
    } else {
        format!("[{}]", deps.join(", "))
    };
    let content = format!(
        "---\nws_id: {ws_id}\nfeature: {feature}\nstatus: backlog\ndepends_on: {deps}\n---\n\n# {ws_id}\n"
    );
    fs::write(dir.join(format!("{ws_id}.md")), content).unwrap();
}

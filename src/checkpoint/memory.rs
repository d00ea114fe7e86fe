//! In-memory checkpoint store (embedding and tests)

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use super::model::Checkpoint;
use super::store::CheckpointStore;
use crate::error::{Result, SdpError};

/// DashMap-backed store that also keeps every saved snapshot in order.
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    current: Arc<DashMap<String, Checkpoint>>,
    history: Arc<Mutex<Vec<Checkpoint>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a checkpoint without recording history
    pub fn insert(&self, checkpoint: Checkpoint) {
        self.current.insert(checkpoint.id.clone(), checkpoint);
    }

    pub fn get(&self, id: &str) -> Option<Checkpoint> {
        self.current.get(id).map(|cp| cp.clone())
    }

    /// Every checkpoint passed to `save`, oldest first
    pub fn history(&self) -> Vec<Checkpoint> {
        self.history.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        self.history.lock().len()
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.history.lock().push(checkpoint.clone());
        self.current
            .insert(checkpoint.id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Checkpoint> {
        self.get(id)
            .ok_or_else(|| SdpError::CheckpointNotFound { id: id.to_string() })
    }
}

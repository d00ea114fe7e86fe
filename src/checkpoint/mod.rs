//! Checkpoint Module - crash-safe progress records
//!
//! - `model`: Checkpoint, CheckpointStatus
//! - `store`: CheckpointStore trait, FileCheckpointStore
//! - `memory`: MemoryCheckpointStore

mod memory;
mod model;
mod store;

pub use memory::MemoryCheckpointStore;
pub use model::{Checkpoint, CheckpointStatus};
pub use store::{validate_checkpoint_id, CheckpointStore, FileCheckpointStore};

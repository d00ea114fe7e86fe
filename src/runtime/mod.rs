//! Runtime Module - feature execution
//!
//! - `orchestrator`: checkpointed sequential run and resume
//! - `retry`: bounded retry with optional backoff
//! - `progress`: progress lines and the CLI-facing coordinator

mod orchestrator;
mod progress;
mod retry;

pub use orchestrator::{remaining_workstreams, Orchestrator};
pub use progress::{
    FeatureCoordinator, ProgressCallback, ProgressReporter, ProgressStatus, ProgressUpdate,
};
pub use retry::{Backoff, RetryExhausted, RetryPolicy};

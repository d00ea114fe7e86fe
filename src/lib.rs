//! SDP - workstream orchestrator for multi-step features
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  workstream/  WorkstreamNode, source + executor contracts    │
//! │  checkpoint/  Checkpoint record and its stores               │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  dag/         DependencyGraph, Kahn scheduling               │
//! │  runtime/     Orchestrator, RetryPolicy, FeatureCoordinator  │
//! │  approval/    N-of-M approval gates                          │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  event/       Typed events (EventLog, EventEmitter)          │
//! │  slo/         Latency percentiles and success rates          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`workstream`] | Workstream model, markdown loader, subprocess executor |
//! | [`dag`] | Dependency graph with cycle and missing-dependency checks |
//! | [`checkpoint`] | Atomic JSON checkpoint files, in-memory store |
//! | [`runtime`] | Sequential checkpointed run/resume with retries |
//! | [`approval`] | Thread-safe approval gate registry |
//! | [`event`] | Event sourcing for audit trail and progress |
//! | [`slo`] | Service-level tracking with warn/error thresholds |
//! | [`config`] | TOML config with `SDP_*` environment overrides |
//! | [`error`] | Error types with fix suggestions |

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL
// ═══════════════════════════════════════════════════════════════
pub mod checkpoint;
pub mod workstream;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER - Scheduling and execution
// ═══════════════════════════════════════════════════════════════
pub mod approval;
pub mod dag;
pub mod runtime;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER - Events, metrics
// ═══════════════════════════════════════════════════════════════
pub mod event;
pub mod slo;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

// Error types
pub use error::{FixSuggestion, Result, SdpError};

// Config types
pub use config::SdpConfig;

// Domain types
pub use checkpoint::{
    Checkpoint, CheckpointStatus, CheckpointStore, FileCheckpointStore, MemoryCheckpointStore,
};
pub use workstream::{
    CommandExecutor, DirectorySource, StaticSource, WorkstreamExecutor, WorkstreamNode,
    WorkstreamSource,
};

// Application types
pub use approval::{ApprovalGate, ApprovalGateManager, GateStatus};
pub use dag::{topological_sort, DependencyGraph, DependencyNode};
pub use runtime::{
    remaining_workstreams, Backoff, FeatureCoordinator, Orchestrator, ProgressStatus,
    ProgressUpdate, RetryPolicy,
};

// Infrastructure types
pub use event::{Event, EventEmitter, EventKind, EventLog, NoopEmitter};
pub use slo::{SloStatus, SloTracker};

// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! SDP Error Types with Error Codes
//!
//! Error code ranges:
//! - SDP-000-009: Feature/workstream errors
//! - SDP-010-019: Dependency graph errors
//! - SDP-020-029: Checkpoint errors
//! - SDP-030-039: Execution errors
//! - SDP-040-049: Approval gate errors
//! - SDP-090-099: Config/IO/serialization errors

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SdpError>;

/// Boxed cause carried by execution failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
///
/// Implements both `thiserror::Error` for std error compatibility
/// and `miette::Diagnostic` for fancy terminal error display.
#[derive(Error, Debug, Diagnostic)]
pub enum SdpError {
    // ═══════════════════════════════════════════
    // FEATURE / WORKSTREAM ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[SDP-001] Feature not found: no workstreams for '{feature_id}'")]
    #[diagnostic(
        code(sdp::feature_not_found),
        help("Check the feature id and the workstream directory")
    )]
    FeatureNotFound { feature_id: String },

    #[error("[SDP-002] Workstream not found: {ws_id}")]
    #[diagnostic(code(sdp::workstream_not_found))]
    WorkstreamNotFound { ws_id: String },

    #[error("[SDP-003] Failed to parse workstream '{path}': {reason}")]
    #[diagnostic(
        code(sdp::workstream_parse),
        help("Front matter must be YAML between '---' lines with ws_id and feature")
    )]
    WorkstreamParse { path: String, reason: String },

    // ═══════════════════════════════════════════
    // DEPENDENCY GRAPH ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[SDP-010] Circular dependency: {details}")]
    #[diagnostic(code(sdp::circular_dependency))]
    CircularDependency { details: String },

    #[error("[SDP-011] Missing dependency: workstream '{ws_id}' depends on unknown '{dep_id}'")]
    #[diagnostic(code(sdp::missing_dependency))]
    MissingDependency { ws_id: String, dep_id: String },

    #[error("[SDP-012] Duplicate workstream id '{ws_id}'")]
    #[diagnostic(code(sdp::duplicate_workstream))]
    DuplicateWorkstream { ws_id: String },

    // ═══════════════════════════════════════════
    // CHECKPOINT ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[SDP-020] Checkpoint not found: {id}")]
    #[diagnostic(code(sdp::checkpoint_not_found))]
    CheckpointNotFound { id: String },

    #[error("[SDP-021] Checkpoint '{id}' IO failed: {reason}")]
    #[diagnostic(code(sdp::checkpoint_io))]
    CheckpointIo { id: String, reason: String },

    #[error("[SDP-022] Checkpoint '{id}' is corrupt: {reason}")]
    #[diagnostic(code(sdp::checkpoint_corrupt))]
    CheckpointCorrupt { id: String, reason: String },

    #[error("[SDP-023] Invalid checkpoint id '{id}': {reason}")]
    #[diagnostic(code(sdp::invalid_checkpoint_id))]
    InvalidCheckpointId { id: String, reason: String },

    // ═══════════════════════════════════════════
    // EXECUTION ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[SDP-030] Workstream '{ws_id}' failed after {attempts} attempt(s): {source}")]
    #[diagnostic(code(sdp::execution_failed))]
    ExecutionFailed {
        ws_id: String,
        attempts: u32,
        #[source]
        source: BoxError,
    },

    // ═══════════════════════════════════════════
    // APPROVAL GATE ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[SDP-040] Invalid gate: {reason}")]
    #[diagnostic(code(sdp::invalid_gate))]
    InvalidGate { reason: String },

    #[error("[SDP-041] Gate '{gate_id}' already exists")]
    #[diagnostic(code(sdp::gate_exists))]
    GateAlreadyExists { gate_id: String },

    #[error("[SDP-042] Gate '{gate_id}' not found")]
    #[diagnostic(code(sdp::gate_not_found))]
    GateNotFound { gate_id: String },

    #[error("[SDP-043] Approver '{approver}' already approved gate '{gate_id}'")]
    #[diagnostic(code(sdp::duplicate_approval))]
    DuplicateApproval { gate_id: String, approver: String },

    #[error("[SDP-044] Gate '{gate_id}' has been rejected: {reason}")]
    #[diagnostic(code(sdp::gate_rejected))]
    GateRejected { gate_id: String, reason: String },

    #[error("[SDP-045] Approver '{approver}' already approved gate '{gate_id}' and cannot reject it")]
    #[diagnostic(code(sdp::reject_after_approval))]
    RejectAfterApproval { gate_id: String, approver: String },

    #[error(
        "[SDP-046] Gate '{gate_id}' is not approved (status: {status}, approvers: {approvers}/{required})"
    )]
    #[diagnostic(code(sdp::gate_not_approved))]
    GateNotApproved {
        gate_id: String,
        status: String,
        approvers: usize,
        required: usize,
    },

    // ═══════════════════════════════════════════
    // CONFIG / IO ERRORS (090-099)
    // ═══════════════════════════════════════════
    #[error("[SDP-090] Config error: {reason}")]
    #[diagnostic(code(sdp::config_error))]
    ConfigError { reason: String },

    #[error("[SDP-093] IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("[SDP-094] JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("[SDP-095] YAML parse error: {0}")]
    #[diagnostic(
        code(sdp::yaml_parse),
        help("Check YAML syntax: indentation must be consistent")
    )]
    YamlParse(#[from] serde_yaml::Error),
}

impl SdpError {
    /// Get the error code (e.g., "SDP-001")
    pub fn code(&self) -> &'static str {
        match self {
            Self::FeatureNotFound { .. } => "SDP-001",
            Self::WorkstreamNotFound { .. } => "SDP-002",
            Self::WorkstreamParse { .. } => "SDP-003",
            Self::CircularDependency { .. } => "SDP-010",
            Self::MissingDependency { .. } => "SDP-011",
            Self::DuplicateWorkstream { .. } => "SDP-012",
            Self::CheckpointNotFound { .. } => "SDP-020",
            Self::CheckpointIo { .. } => "SDP-021",
            Self::CheckpointCorrupt { .. } => "SDP-022",
            Self::InvalidCheckpointId { .. } => "SDP-023",
            Self::ExecutionFailed { .. } => "SDP-030",
            Self::InvalidGate { .. } => "SDP-040",
            Self::GateAlreadyExists { .. } => "SDP-041",
            Self::GateNotFound { .. } => "SDP-042",
            Self::DuplicateApproval { .. } => "SDP-043",
            Self::GateRejected { .. } => "SDP-044",
            Self::RejectAfterApproval { .. } => "SDP-045",
            Self::GateNotApproved { .. } => "SDP-046",
            Self::ConfigError { .. } => "SDP-090",
            Self::IoError(_) => "SDP-093",
            Self::JsonError(_) => "SDP-094",
            Self::YamlParse(_) => "SDP-095",
        }
    }

    /// Whether rerunning the same command may succeed without fixing input data.
    ///
    /// Graph and validation errors are never recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ExecutionFailed { .. }
                | Self::CheckpointIo { .. }
                | Self::GateNotApproved { .. }
                | Self::IoError(_)
        )
    }
}

impl FixSuggestion for SdpError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            SdpError::FeatureNotFound { .. } => {
                Some("Check --workstream-dir and the 'feature' field in workstream front matter")
            }
            SdpError::WorkstreamNotFound { .. } => Some("Check the workstream id spelling"),
            SdpError::WorkstreamParse { .. } => {
                Some("Add a '---' front matter block with ws_id and feature")
            }
            SdpError::CircularDependency { .. } => {
                Some("Remove one dependency from the cycle so the graph is acyclic")
            }
            SdpError::MissingDependency { .. } => {
                Some("Add the missing workstream or remove it from depends_on")
            }
            SdpError::DuplicateWorkstream { .. } => Some("Give each workstream a unique ws_id"),
            SdpError::CheckpointNotFound { .. } => {
                Some("Run 'sdp checkpoint list' to see available checkpoints")
            }
            SdpError::CheckpointIo { .. } => {
                Some("Check permissions and free space in the checkpoint directory")
            }
            SdpError::CheckpointCorrupt { .. } => {
                Some("Delete the checkpoint file and start a fresh run")
            }
            SdpError::InvalidCheckpointId { .. } => {
                Some("Checkpoint ids must not contain path separators or '..'")
            }
            SdpError::ExecutionFailed { .. } => {
                Some("Fix the workstream, then run 'sdp resume <feature>' to continue")
            }
            SdpError::InvalidGate { .. } => {
                Some("Gates need a non-empty id and name and at least one required approver")
            }
            SdpError::GateAlreadyExists { .. } => Some("Use a different gate id or delete the old gate"),
            SdpError::GateNotFound { .. } => Some("Create the gate before approving or checking it"),
            SdpError::DuplicateApproval { .. } => Some("Each approver can approve a gate once"),
            SdpError::GateRejected { .. } => Some("Create a new gate once the rejection is addressed"),
            SdpError::RejectAfterApproval { .. } => {
                Some("A different approver must reject this gate")
            }
            SdpError::GateNotApproved { .. } => Some("Collect the remaining approvals"),
            SdpError::ConfigError { .. } => {
                Some("Check .sdp/config.toml syntax and SDP_* environment variables")
            }
            SdpError::IoError(_) => Some("Check file permissions and paths"),
            SdpError::JsonError(_) => Some("Check JSON syntax"),
            SdpError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
        }
    }
}

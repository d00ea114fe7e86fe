//! ApprovalGateManager - thread-safe gate registry
//!
//! Mutations take the write lock, queries the read lock. Returned gates are
//! snapshots; the registry itself is never exposed.

use chrono::Utc;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use super::gate::{Approval, ApprovalGate, GateStatus};
use crate::error::{Result, SdpError};

#[derive(Debug, Default)]
pub struct ApprovalGateManager {
    gates: RwLock<FxHashMap<String, ApprovalGate>>,
}

fn not_found(gate_id: &str) -> SdpError {
    SdpError::GateNotFound {
        gate_id: gate_id.to_string(),
    }
}

fn sorted(mut gates: Vec<ApprovalGate>) -> Vec<ApprovalGate> {
    gates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    gates
}

impl ApprovalGateManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gate.
    ///
    /// Requires a non-empty id and name and at least one required approver.
    pub fn create_gate(&self, mut gate: ApprovalGate) -> Result<()> {
        if gate.id.trim().is_empty() {
            return Err(SdpError::InvalidGate {
                reason: "gate id cannot be empty".into(),
            });
        }
        if gate.name.trim().is_empty() {
            return Err(SdpError::InvalidGate {
                reason: "gate name cannot be empty".into(),
            });
        }
        if gate.required_approvers < 1 {
            return Err(SdpError::InvalidGate {
                reason: "required approvers must be at least 1".into(),
            });
        }

        let mut gates = self.gates.write();
        if gates.contains_key(&gate.id) {
            return Err(SdpError::GateAlreadyExists { gate_id: gate.id });
        }

        let now = Utc::now();
        gate.created_at = now;
        gate.updated_at = now;

        debug!(gate_id = %gate.id, required = gate.required_approvers, "gate created");
        gates.insert(gate.id.clone(), gate);
        Ok(())
    }

    pub fn get_gate(&self, gate_id: &str) -> Result<ApprovalGate> {
        self.gates
            .read()
            .get(gate_id)
            .cloned()
            .ok_or_else(|| not_found(gate_id))
    }

    /// All gates, oldest first
    pub fn list_gates(&self) -> Vec<ApprovalGate> {
        sorted(self.gates.read().values().cloned().collect())
    }

    /// Gates still waiting for sign-off, oldest first
    pub fn pending_approvals(&self) -> Vec<ApprovalGate> {
        sorted(
            self.gates
                .read()
                .values()
                .filter(|g| g.status == GateStatus::Pending)
                .cloned()
                .collect(),
        )
    }

    pub fn delete_gate(&self, gate_id: &str) -> Result<()> {
        self.gates
            .write()
            .remove(gate_id)
            .map(|_| ())
            .ok_or_else(|| not_found(gate_id))
    }

    /// Record an approval.
    ///
    /// The gate becomes `Approved` once the approver count reaches the
    /// requirement. Duplicate approvers and rejected gates are refused.
    pub fn approve(&self, gate_id: &str, approver: &str, note: &str) -> Result<GateStatus> {
        if approver.trim().is_empty() {
            return Err(SdpError::InvalidGate {
                reason: "approver cannot be empty".into(),
            });
        }

        let mut gates = self.gates.write();
        let gate = gates.get_mut(gate_id).ok_or_else(|| not_found(gate_id))?;

        if gate.has_approved(approver) {
            return Err(SdpError::DuplicateApproval {
                gate_id: gate_id.to_string(),
                approver: approver.to_string(),
            });
        }
        if gate.status == GateStatus::Rejected {
            return Err(SdpError::GateRejected {
                gate_id: gate_id.to_string(),
                reason: gate.rejection_reason.clone().unwrap_or_default(),
            });
        }

        let now = Utc::now();
        gate.approvers.insert(
            approver.to_string(),
            Approval {
                approver: approver.to_string(),
                note: note.to_string(),
                approved_at: now,
            },
        );
        gate.updated_at = now;

        if gate.approver_count() >= gate.required_approvers {
            if gate.status != GateStatus::Approved {
                info!(gate_id, approvers = gate.approver_count(), "gate approved");
            }
            gate.status = GateStatus::Approved;
        }

        Ok(gate.status)
    }

    /// Reject a gate regardless of other approvals.
    ///
    /// Refused when `approver` already approved this gate.
    pub fn reject(&self, gate_id: &str, approver: &str, reason: &str) -> Result<()> {
        if approver.trim().is_empty() {
            return Err(SdpError::InvalidGate {
                reason: "approver cannot be empty".into(),
            });
        }

        let mut gates = self.gates.write();
        let gate = gates.get_mut(gate_id).ok_or_else(|| not_found(gate_id))?;

        if gate.has_approved(approver) {
            return Err(SdpError::RejectAfterApproval {
                gate_id: gate_id.to_string(),
                approver: approver.to_string(),
            });
        }

        gate.status = GateStatus::Rejected;
        gate.rejected_by = Some(approver.to_string());
        gate.rejection_reason = Some(reason.to_string());
        gate.updated_at = Utc::now();

        info!(gate_id, approver, reason, "gate rejected");
        Ok(())
    }

    /// Ok only when the gate is `Approved`
    pub fn check_gate_approved(&self, gate_id: &str) -> Result<()> {
        let gates = self.gates.read();
        let gate = gates.get(gate_id).ok_or_else(|| not_found(gate_id))?;

        match gate.status {
            GateStatus::Approved => Ok(()),
            GateStatus::Rejected => Err(SdpError::GateRejected {
                gate_id: gate_id.to_string(),
                reason: gate.rejection_reason.clone().unwrap_or_default(),
            }),
            GateStatus::Pending => Err(SdpError::GateNotApproved {
                gate_id: gate_id.to_string(),
                status: gate.status.to_string(),
                approvers: gate.approver_count(),
                required: gate.required_approvers,
            }),
        }
    }

    /// Guard for workflow steps; does not wait.
    ///
    /// Same result as `check_gate_approved`: callers poll or surface the error.
    pub fn block_execution_until_approved(&self, gate_id: &str) -> Result<()> {
        self.check_gate_approved(gate_id)
    }

    pub fn approver_count(&self, gate_id: &str) -> Result<usize> {
        self.gates
            .read()
            .get(gate_id)
            .map(ApprovalGate::approver_count)
            .ok_or_else(|| not_found(gate_id))
    }

    pub fn len(&self) -> usize {
        self.gates.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

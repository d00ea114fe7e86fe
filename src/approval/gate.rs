//! Approval gate record

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Pending,
    Approved,
    Rejected,
}

impl GateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded sign-off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approval {
    pub approver: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    pub approved_at: DateTime<Utc>,
}

/// Named N-of-M sign-off barrier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalGate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub required_approvers: usize,
    /// Keyed by approver, so each approver counts once
    #[serde(default)]
    pub approvers: BTreeMap<String, Approval>,
    pub status: GateStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApprovalGate {
    /// New pending gate with no approvals
    pub fn new(id: impl Into<String>, name: impl Into<String>, required_approvers: usize) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            required_approvers,
            approvers: BTreeMap::new(),
            status: GateStatus::Pending,
            rejected_by: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn approver_count(&self) -> usize {
        self.approvers.len()
    }

    pub fn has_approved(&self, approver: &str) -> bool {
        self.approvers.contains_key(approver)
    }

    pub fn is_approved(&self) -> bool {
        self.status == GateStatus::Approved
    }
}

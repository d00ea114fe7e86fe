//! Approval gate integration tests, including concurrent sign-off

use std::sync::Arc;
use std::thread;

use sdp::approval::{ApprovalGate, ApprovalGateManager, GateStatus};
use sdp::error::SdpError;

#[test]
fn test_release_gate_lifecycle() {
    let manager = ApprovalGateManager::new();
    manager
        .create_gate(ApprovalGate::new("release", "Release sign-off", 2).with_description("v1.2"))
        .unwrap();

    let err = manager.check_gate_approved("release").unwrap_err();
    assert!(matches!(err, SdpError::GateNotApproved { approvers: 0, required: 2, .. }));
    assert!(err.is_recoverable());

    manager.approve("release", "alice", "qa passed").unwrap();
    manager.approve("release", "bob", "").unwrap();

    assert!(manager.check_gate_approved("release").is_ok());
    assert!(manager.block_execution_until_approved("release").is_ok());
    assert!(manager.pending_approvals().is_empty());
}

#[test]
fn test_rejection_is_terminal() {
    let manager = ApprovalGateManager::new();
    manager.create_gate(ApprovalGate::new("g", "Gate", 1)).unwrap();
    manager.reject("g", "carol", "security review").unwrap();

    assert!(matches!(
        manager.check_gate_approved("g"),
        Err(SdpError::GateRejected { .. })
    ));
    assert!(matches!(
        manager.approve("g", "dave", ""),
        Err(SdpError::GateRejected { .. })
    ));
    assert_eq!(manager.get_gate("g").unwrap().status, GateStatus::Rejected);
}

#[test]
fn test_rejecting_approved_gate_revokes_it() {
    let manager = ApprovalGateManager::new();
    manager.create_gate(ApprovalGate::new("g", "Gate", 2)).unwrap();
    manager.approve("g", "alice", "").unwrap();
    manager.approve("g", "bob", "").unwrap();
    manager.check_gate_approved("g").unwrap();

    // an approver cannot turn around and reject
    assert!(matches!(
        manager.reject("g", "alice", "changed my mind"),
        Err(SdpError::RejectAfterApproval { .. })
    ));
    manager.check_gate_approved("g").unwrap();

    manager.reject("g", "carol", "late finding").unwrap();
    match manager.check_gate_approved("g") {
        Err(SdpError::GateRejected { gate_id, reason }) => {
            assert_eq!(gate_id, "g");
            assert_eq!(reason, "late finding");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    let gate = manager.get_gate("g").unwrap();
    assert_eq!(gate.status, GateStatus::Rejected);
    assert_eq!(gate.approver_count(), 2);
}

#[test]
fn test_snapshot_does_not_alias_registry() {
    let manager = ApprovalGateManager::new();
    manager.create_gate(ApprovalGate::new("g", "Gate", 1)).unwrap();

    let mut snapshot = manager.get_gate("g").unwrap();
    snapshot.status = GateStatus::Approved;

    assert_eq!(manager.get_gate("g").unwrap().status, GateStatus::Pending);
}

#[test]
fn test_concurrent_distinct_approvals() {
    let manager = Arc::new(ApprovalGateManager::new());
    manager.create_gate(ApprovalGate::new("g", "Gate", 10)).unwrap();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || manager.approve("g", &format!("approver-{i}"), ""))
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let gate = manager.get_gate("g").unwrap();
    assert_eq!(gate.approver_count(), 10);
    assert_eq!(gate.status, GateStatus::Approved);
}

#[test]
fn test_concurrent_same_approver_counts_once() {
    let manager = Arc::new(ApprovalGateManager::new());
    manager.create_gate(ApprovalGate::new("g", "Gate", 2)).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || manager.approve("g", "alice", "").is_ok())
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(successes, 1);
    assert_eq!(manager.approver_count("g").unwrap(), 1);
    assert_eq!(manager.get_gate("g").unwrap().status, GateStatus::Pending);
}

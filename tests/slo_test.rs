//! SLO tracker integration tests

use std::time::Duration;

use sdp::slo::{percentile, SloTracker, CHECKPOINT_SAVE_LATENCY_TARGET};

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[test]
fn test_checkpoint_save_p95_breach() {
    let tracker = SloTracker::new();
    for v in [50, 100, 150, 200, 250] {
        tracker.record_checkpoint_save(ms(v));
    }

    let status = tracker.status();
    assert!((status.checkpoint_save_latency - 0.25).abs() < 1e-9);
    assert!(!status.checkpoint_save_latency_ok);
    assert!(!status.overall_compliance);
    assert_eq!(tracker.checkpoint_save_samples(), 5);
}

#[test]
fn test_fast_saves_are_compliant() {
    let tracker = SloTracker::new();
    for _ in 0..50 {
        tracker.record_checkpoint_save(ms(5));
    }
    tracker.record_checkpoint_save(CHECKPOINT_SAVE_LATENCY_TARGET);

    let status = tracker.status();
    assert!(status.checkpoint_save_latency_ok);
    assert!(status.overall_compliance);
}

#[test]
fn test_recovery_rate_defaults_to_one() {
    let status = SloTracker::new().status();
    assert_eq!(status.recovery_success_rate, 1.0);
    assert!(status.recovery_success_rate_ok);
}

#[test]
fn test_recovery_single_failure_breaches() {
    let tracker = SloTracker::new();
    tracker.record_recovery(true);
    tracker.record_recovery(false);

    let status = tracker.status();
    assert!((status.recovery_success_rate - 0.5).abs() < 1e-9);
    assert!(!status.recovery_success_rate_ok);
    assert_eq!(tracker.recovery_counts(), (2, 1));
}

#[test]
fn test_graph_build_and_execution_streams() {
    let tracker = SloTracker::new();
    tracker.record_graph_build(3, ms(2));
    tracker.record_ws_execution("ws-1", Duration::from_secs(10 * 60));

    let status = tracker.status();
    assert!(status.graph_build_time_ok);
    assert!(status.ws_execution_time_ok);
    assert!((status.ws_execution_time - 600.0).abs() < 1e-9);
}

#[test]
fn test_percentile_nearest_rank_by_hand() {
    let values: Vec<f64> = (1..=100).map(f64::from).collect();
    assert_eq!(percentile(&values, 95.0), 95.0);
    assert_eq!(percentile(&values, 100.0), 100.0);
    assert_eq!(percentile(&[7.0], 95.0), 7.0);
}

#[test]
fn test_status_serializes() {
    let tracker = SloTracker::new();
    tracker.record_checkpoint_save(ms(10));
    let json = serde_json::to_value(tracker.status()).unwrap();
    assert_eq!(json["overall_compliance"], serde_json::json!(true));
    assert!(json.get("checkpoint_save_latency").is_some());
}

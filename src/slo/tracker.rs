//! SLO tracker for the engine's own operations
//!
//! Four independent streams:
//!
//! | Stream | Target (p95 / rate) | Alert |
//! |--------|---------------------|-------|
//! | checkpoint save | 100ms | 150ms |
//! | workstream execution | 30min | 45min |
//! | graph build | 5s | 10s |
//! | recovery success | 99.9% | 99.5% |
//!
//! Samples above target log a warning; above the alert threshold, an error.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, warn};

use super::metric::Metric;

pub const CHECKPOINT_SAVE_LATENCY_TARGET: Duration = Duration::from_millis(100);
pub const CHECKPOINT_SAVE_LATENCY_ALERT: Duration = Duration::from_millis(150);

pub const WS_EXECUTION_TIME_TARGET: Duration = Duration::from_secs(30 * 60);
pub const WS_EXECUTION_TIME_ALERT: Duration = Duration::from_secs(45 * 60);

pub const GRAPH_BUILD_TIME_TARGET: Duration = Duration::from_secs(5);
pub const GRAPH_BUILD_TIME_ALERT: Duration = Duration::from_secs(10);

pub const RECOVERY_SUCCESS_TARGET: f64 = 0.999;
pub const RECOVERY_SUCCESS_ALERT: f64 = 0.995;

/// Point-in-time compliance report. Latencies are p95 in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SloStatus {
    pub checkpoint_save_latency: f64,
    pub checkpoint_save_latency_ok: bool,
    pub ws_execution_time: f64,
    pub ws_execution_time_ok: bool,
    pub graph_build_time: f64,
    pub graph_build_time_ok: bool,
    pub recovery_success_rate: f64,
    pub recovery_success_rate_ok: bool,
    pub overall_compliance: bool,
}

impl fmt::Display for SloStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |ok: bool| if ok { "ok" } else { "BREACH" };
        writeln!(
            f,
            "checkpoint save p95: {:.3}s ({})",
            self.checkpoint_save_latency,
            mark(self.checkpoint_save_latency_ok)
        )?;
        writeln!(
            f,
            "workstream execution p95: {:.1}s ({})",
            self.ws_execution_time,
            mark(self.ws_execution_time_ok)
        )?;
        writeln!(
            f,
            "graph build p95: {:.3}s ({})",
            self.graph_build_time,
            mark(self.graph_build_time_ok)
        )?;
        writeln!(
            f,
            "recovery success: {:.2}% ({})",
            self.recovery_success_rate * 100.0,
            mark(self.recovery_success_rate_ok)
        )?;
        write!(
            f,
            "overall: {}",
            if self.overall_compliance {
                "compliant"
            } else {
                "not compliant"
            }
        )
    }
}

/// Thread-safe SLO accumulator, owned by the caller and shared via `Arc`
#[derive(Debug, Default)]
pub struct SloTracker {
    checkpoint_save: Metric,
    ws_execution: Metric,
    graph_build: Metric,
    recovery: Metric,
}

impl SloTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_checkpoint_save(&self, duration: Duration) {
        self.checkpoint_save.record(duration.as_secs_f64());

        if duration > CHECKPOINT_SAVE_LATENCY_ALERT {
            error!(
                duration_ms = duration.as_millis() as u64,
                alert_ms = CHECKPOINT_SAVE_LATENCY_ALERT.as_millis() as u64,
                "SLO alert: checkpoint save latency above alert threshold"
            );
        } else if duration > CHECKPOINT_SAVE_LATENCY_TARGET {
            warn!(
                duration_ms = duration.as_millis() as u64,
                target_ms = CHECKPOINT_SAVE_LATENCY_TARGET.as_millis() as u64,
                "SLO breach: checkpoint save latency exceeds target"
            );
        }
    }

    pub fn record_ws_execution(&self, ws_id: &str, duration: Duration) {
        self.ws_execution.record(duration.as_secs_f64());

        if duration > WS_EXECUTION_TIME_ALERT {
            error!(
                ws_id,
                duration_secs = duration.as_secs(),
                alert_secs = WS_EXECUTION_TIME_ALERT.as_secs(),
                "SLO alert: workstream execution time above alert threshold"
            );
        } else if duration > WS_EXECUTION_TIME_TARGET {
            warn!(
                ws_id,
                duration_secs = duration.as_secs(),
                target_secs = WS_EXECUTION_TIME_TARGET.as_secs(),
                "SLO breach: workstream execution time exceeds target"
            );
        }
    }

    pub fn record_graph_build(&self, node_count: usize, duration: Duration) {
        self.graph_build.record(duration.as_secs_f64());

        if duration > GRAPH_BUILD_TIME_ALERT {
            error!(
                node_count,
                duration_secs = duration.as_secs_f64(),
                alert_secs = GRAPH_BUILD_TIME_ALERT.as_secs(),
                "SLO alert: graph build time above alert threshold"
            );
        } else if duration > GRAPH_BUILD_TIME_TARGET {
            warn!(
                node_count,
                duration_secs = duration.as_secs_f64(),
                target_secs = GRAPH_BUILD_TIME_TARGET.as_secs(),
                "SLO breach: graph build time exceeds target"
            );
        }
    }

    pub fn record_recovery(&self, success: bool) {
        self.recovery.record_outcome(success);

        let rate = self.recovery.success_rate();
        if rate < RECOVERY_SUCCESS_ALERT {
            error!(
                success_rate = rate,
                alert = RECOVERY_SUCCESS_ALERT,
                "SLO alert: recovery success rate below alert threshold"
            );
        } else if rate < RECOVERY_SUCCESS_TARGET {
            warn!(
                success_rate = rate,
                target = RECOVERY_SUCCESS_TARGET,
                "SLO breach: recovery success rate below target"
            );
        }
    }

    /// Compute p95 per latency stream and the recovery rate
    pub fn status(&self) -> SloStatus {
        let checkpoint_save_latency = self.checkpoint_save.percentile(95.0);
        let ws_execution_time = self.ws_execution.percentile(95.0);
        let graph_build_time = self.graph_build.percentile(95.0);
        let recovery_success_rate = self.recovery.success_rate();

        let checkpoint_save_latency_ok =
            checkpoint_save_latency <= CHECKPOINT_SAVE_LATENCY_TARGET.as_secs_f64();
        let ws_execution_time_ok = ws_execution_time <= WS_EXECUTION_TIME_TARGET.as_secs_f64();
        let graph_build_time_ok = graph_build_time <= GRAPH_BUILD_TIME_TARGET.as_secs_f64();
        let recovery_success_rate_ok = recovery_success_rate >= RECOVERY_SUCCESS_TARGET;

        SloStatus {
            checkpoint_save_latency,
            checkpoint_save_latency_ok,
            ws_execution_time,
            ws_execution_time_ok,
            graph_build_time,
            graph_build_time_ok,
            recovery_success_rate,
            recovery_success_rate_ok,
            overall_compliance: checkpoint_save_latency_ok
                && ws_execution_time_ok
                && graph_build_time_ok
                && recovery_success_rate_ok,
        }
    }

    pub fn checkpoint_save_samples(&self) -> usize {
        self.checkpoint_save.len()
    }

    pub fn ws_execution_samples(&self) -> usize {
        self.ws_execution.len()
    }

    pub fn graph_build_samples(&self) -> usize {
        self.graph_build.len()
    }

    /// `(attempts, successes)`
    pub fn recovery_counts(&self) -> (u64, u64) {
        self.recovery.counts()
    }
}

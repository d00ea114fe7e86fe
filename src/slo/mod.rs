//! SLO Module - latency percentiles and success rates
//!
//! - `metric`: Metric stream, nearest-rank percentile
//! - `tracker`: SloTracker, SloStatus, target constants

mod metric;
mod tracker;

pub use metric::{percentile, Metric};
pub use tracker::{
    SloStatus, SloTracker, CHECKPOINT_SAVE_LATENCY_ALERT, CHECKPOINT_SAVE_LATENCY_TARGET,
    GRAPH_BUILD_TIME_ALERT, GRAPH_BUILD_TIME_TARGET, RECOVERY_SUCCESS_ALERT,
    RECOVERY_SUCCESS_TARGET, WS_EXECUTION_TIME_ALERT, WS_EXECUTION_TIME_TARGET,
};

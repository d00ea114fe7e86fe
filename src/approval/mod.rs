//! Approval Module - N-of-M sign-off gates
//!
//! Gates have no structural link to the scheduler; callers check them
//! wherever their workflow needs a barrier.

mod gate;
mod manager;

pub use gate::{Approval, ApprovalGate, GateStatus};
pub use manager::ApprovalGateManager;

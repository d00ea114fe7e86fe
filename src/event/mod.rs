//! Event Module - typed orchestration events
//!
//! - `log`: Event, EventKind, EventLog
//! - `emitter`: EventEmitter trait, NoopEmitter

mod emitter;
mod log;

pub use emitter::{EventEmitter, NoopEmitter};
pub use log::{Event, EventKind, EventLog};

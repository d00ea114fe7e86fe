//! EventEmitter Trait - abstraction for event emission
//!
//! Enables dependency injection: EventLog or a progress reporter in
//! production, NoopEmitter when nobody listens.

use super::log::{EventKind, EventLog};

/// Trait for emitting events during orchestration
pub trait EventEmitter: Send + Sync {
    /// Emit an event and return its ID
    fn emit(&self, kind: EventKind) -> u64;
}

impl EventEmitter for EventLog {
    fn emit(&self, kind: EventKind) -> u64 {
        EventLog::emit(self, kind)
    }
}

/// No-op emitter (zero allocation, always returns 0)
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl EventEmitter for NoopEmitter {
    fn emit(&self, _kind: EventKind) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn event_emitter_trait_is_object_safe() {
        fn accepts_emitter(_: &dyn EventEmitter) {}

        accepts_emitter(&EventLog::new());
        accepts_emitter(&NoopEmitter::new());
    }

    #[test]
    fn eventlog_emitter_records_through_arc() {
        let log = EventLog::new();
        let emitter: Arc<dyn EventEmitter> = Arc::new(log.clone());
        let id = emitter.emit(EventKind::ExecutionPlanned {
            feature_id: "F".into(),
            order: vec!["a".into()],
        });
        assert_eq!(id, 0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn noop_emitter_returns_zero() {
        let noop = NoopEmitter::new();
        let id = noop.emit(EventKind::FeatureFailed {
            feature_id: "F".into(),
            error: "boom".into(),
            failed_workstream: None,
        });
        assert_eq!(id, 0);
    }
}

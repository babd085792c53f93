//! Event emitter port
//!
//! Coordinators report progress through an [`EventEmitter`] capability
//! instead of a global broadcast manager. Emitting is best-effort and must
//! never block a debate: implementations drop events they cannot deliver.

use debate_domain::{DebateEvent, SessionId};
use std::sync::Arc;

/// Sink for debate progress events
pub trait EventEmitter: Send + Sync {
    fn emit(&self, session_id: &SessionId, event: DebateEvent);
}

/// No-op emitter
pub struct NoEmitter;

impl EventEmitter for NoEmitter {
    fn emit(&self, _session_id: &SessionId, _event: DebateEvent) {}
}

/// Emitter that forwards every event to several delegates, in order.
#[derive(Clone, Default)]
pub struct CompositeEmitter {
    delegates: Vec<Arc<dyn EventEmitter>>,
}

impl CompositeEmitter {
    pub fn new(delegates: Vec<Arc<dyn EventEmitter>>) -> Self {
        Self { delegates }
    }

    pub fn push(&mut self, delegate: Arc<dyn EventEmitter>) {
        self.delegates.push(delegate);
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl EventEmitter for CompositeEmitter {
    fn emit(&self, session_id: &SessionId, event: DebateEvent) {
        if let Some((last, rest)) = self.delegates.split_last() {
            for delegate in rest {
                delegate.emit(session_id, event.clone());
            }
            last.emit(session_id, event);
        }
    }
}

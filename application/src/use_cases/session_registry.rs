//! Registry of running debates, used to route cancellation requests

use debate_domain::SessionId;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Maps each running session to its cancellation token.
///
/// Every token is a child of one root token, so [`shutdown`](Self::shutdown)
/// cancels every debate at once.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    root: CancellationToken,
    sessions: Mutex<HashMap<SessionId, CancellationToken>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` and return the token its debate must observe.
    pub fn register(&self, id: SessionId) -> CancellationToken {
        let token = self.root.child_token();
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(id, token.clone());
        }
        token
    }

    /// Cancel one session. Returns false if it is unknown or already removed.
    pub fn cancel(&self, id: &SessionId) -> bool {
        let token = self
            .sessions
            .lock()
            .ok()
            .and_then(|sessions| sessions.get(id).cloned());
        match token {
            Some(token) => {
                debug!(session = %id, "cancelling session");
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: &SessionId) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(id);
        }
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions
            .lock()
            .map(|sessions| sessions.contains_key(id))
            .unwrap_or(false)
    }

    pub fn active_ids(&self) -> Vec<SessionId> {
        self.sessions
            .lock()
            .map(|sessions| sessions.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Cancel every registered and future session.
    pub fn shutdown(&self) {
        self.root.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_only_hits_the_named_session() {
        let registry = SessionRegistry::new();
        let a = registry.register(SessionId::from("a"));
        let b = registry.register(SessionId::from("b"));

        assert!(registry.cancel(&SessionId::from("a")));
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
        assert!(!registry.cancel(&SessionId::from("missing")));
    }

    #[test]
    fn test_remove_forgets_session() {
        let registry = SessionRegistry::new();
        registry.register(SessionId::from("a"));
        assert!(registry.contains(&SessionId::from("a")));

        registry.remove(&SessionId::from("a"));
        assert!(!registry.contains(&SessionId::from("a")));
        assert!(registry.active_ids().is_empty());
    }

    #[test]
    fn test_shutdown_cancels_everything() {
        let registry = SessionRegistry::new();
        let a = registry.register(SessionId::from("a"));
        registry.shutdown();
        let late = registry.register(SessionId::from("late"));

        assert!(a.is_cancelled());
        assert!(late.is_cancelled());
    }
}

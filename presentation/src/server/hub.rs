//! Routes session events to the websocket connection that started them

use debate_application::EventEmitter;
use debate_domain::{DebateEvent, EventEnvelope, SessionId};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Outgoing queue of one connection
pub type Outbox = mpsc::Sender<EventEnvelope>;

/// Session id to connection outbox.
///
/// Delivery never blocks the debate. Progress events for a full outbox are
/// dropped; a terminal event that finds the outbox full is handed to a
/// background send so the client still learns how the debate ended. A
/// session's route is removed with its terminal event.
#[derive(Debug, Default)]
pub struct SessionHub {
    routes: Mutex<HashMap<SessionId, Outbox>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, id: SessionId, outbox: Outbox) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert(id, outbox);
        }
    }

    pub fn detach(&self, id: &SessionId) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.remove(id);
        }
    }

    pub fn is_attached(&self, id: &SessionId) -> bool {
        self.routes
            .lock()
            .map(|routes| routes.contains_key(id))
            .unwrap_or(false)
    }

    fn outbox(&self, id: &SessionId) -> Option<Outbox> {
        self.routes.lock().ok()?.get(id).cloned()
    }
}

impl EventEmitter for SessionHub {
    fn emit(&self, session_id: &SessionId, event: DebateEvent) {
        let Some(outbox) = self.outbox(session_id) else {
            debug!(session = %session_id, event = event.name(), "no connection for session");
            return;
        };

        let terminal = event.is_terminal();
        match outbox.try_send(EventEnvelope::new(session_id.clone(), event)) {
            Ok(()) => {}
            Err(TrySendError::Full(envelope)) if terminal => {
                match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => {
                        debug!(session = %session_id, "connection outbox full, deferring terminal event");
                        runtime.spawn(async move {
                            let session = envelope.session_id.clone();
                            if outbox.send(envelope).await.is_err() {
                                debug!(session = %session, "connection closed before terminal event");
                            }
                        });
                    }
                    Err(_) => warn!(
                        session = %session_id,
                        event = envelope.event.name(),
                        "connection outbox full, dropping terminal event"
                    ),
                }
            }
            Err(TrySendError::Full(envelope)) => {
                warn!(
                    session = %session_id,
                    event = envelope.event.name(),
                    "connection outbox full, dropping event"
                );
            }
            Err(TrySendError::Closed(_)) => {
                debug!(session = %session_id, "connection closed, dropping event");
            }
        }

        if terminal {
            self.detach(session_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_routes_only_to_the_owning_connection() {
        let hub = SessionHub::new();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        hub.attach(SessionId::from("a"), tx_a);
        hub.attach(SessionId::from("b"), tx_b);

        hub.emit(&SessionId::from("a"), DebateEvent::Pong);
        hub.emit(&SessionId::from("unknown"), DebateEvent::Pong);

        let envelope = rx_a.try_recv().unwrap();
        assert_eq!(envelope.session_id, SessionId::from("a"));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_full_outbox_drops_without_blocking() {
        let hub = SessionHub::new();
        let (tx, mut rx) = mpsc::channel(1);
        hub.attach(SessionId::from("a"), tx);

        hub.emit(&SessionId::from("a"), DebateEvent::Pong);
        hub.emit(
            &SessionId::from("a"),
            DebateEvent::CouncilPeerReviewStart { total_reviews: 6 },
        );

        assert_eq!(rx.try_recv().unwrap().event, DebateEvent::Pong);
        assert!(rx.try_recv().is_err());
        assert!(hub.is_attached(&SessionId::from("a")));
    }

    #[tokio::test]
    async fn test_terminal_event_waits_for_room_in_a_full_outbox() {
        let hub = SessionHub::new();
        let (tx, mut rx) = mpsc::channel(1);
        hub.attach(SessionId::from("a"), tx);

        hub.emit(&SessionId::from("a"), DebateEvent::Pong);
        hub.emit(
            &SessionId::from("a"),
            DebateEvent::Error {
                message: "synthesis failed".to_string(),
            },
        );
        assert!(!hub.is_attached(&SessionId::from("a")));

        assert_eq!(rx.recv().await.unwrap().event, DebateEvent::Pong);
        let last = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("terminal event in time")
            .expect("outbox open");
        assert_eq!(
            last.event,
            DebateEvent::Error {
                message: "synthesis failed".to_string()
            }
        );
    }

    #[test]
    fn test_terminal_event_detaches_session() {
        let hub = SessionHub::new();
        let (tx, mut rx) = mpsc::channel(8);
        hub.attach(SessionId::from("a"), tx);

        hub.emit(&SessionId::from("a"), DebateEvent::DebateCancelled);
        assert!(!hub.is_attached(&SessionId::from("a")));
        assert_eq!(rx.try_recv().unwrap().event, DebateEvent::DebateCancelled);

        // closed receivers are tolerated
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        hub.attach(SessionId::from("b"), tx);
        hub.emit(&SessionId::from("b"), DebateEvent::Pong);
    }
}

//! One websocket client
//!
//! Each connection owns an outbox that the [`SessionHub`](super::SessionHub)
//! fills with the events of the debates this connection started. Closing the
//! socket cancels those debates.

use super::ServerState;
use super::protocol::ClientMessage;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use debate_application::LlmGateway;
use debate_domain::{DebateEvent, DebateSession, EventEnvelope, Question, SessionId};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events buffered per connection before the hub starts dropping
pub const OUTBOX_CAPACITY: usize = 1024;

pub async fn ws_handler<G: LlmGateway + 'static>(
    ws: WebSocketUpgrade,
    State(state): State<ServerState<G>>,
) -> Response {
    ws.on_upgrade(move |socket| run_socket(socket, state))
}

async fn run_socket<G: LlmGateway + 'static>(socket: WebSocket, state: ServerState<G>) {
    let (mut sink, mut stream) = socket.split();
    let (outbox, mut inbox) = mpsc::channel(OUTBOX_CAPACITY);
    let mut connection = Connection::new(state, outbox);
    info!(connection = %connection.id(), "client connected");

    loop {
        tokio::select! {
            Some(envelope) = inbox.recv() => {
                connection.observe(&envelope);
                let text = match envelope.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("failed to serialize {} event: {}", envelope.event.name(), e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    debug!(connection = %connection.id(), "send failed: {}", e);
                    break;
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => connection.handle_text(&text),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(connection = %connection.id(), "receive failed: {}", e);
                    break;
                }
            },
        }
    }

    info!(connection = %connection.id(), "client disconnected");
    connection.close();
}

/// Protocol state of one client, independent of the socket
pub struct Connection<G: LlmGateway + 'static> {
    /// Session id used for events that belong to no debate (pong, protocol errors)
    id: SessionId,
    state: ServerState<G>,
    outbox: mpsc::Sender<EventEnvelope>,
    active: Vec<SessionId>,
}

impl<G: LlmGateway + 'static> Connection<G> {
    pub fn new(state: ServerState<G>, outbox: mpsc::Sender<EventEnvelope>) -> Self {
        Self {
            id: SessionId::generate(),
            state,
            outbox,
            active: Vec::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Debates started here that have not reached a terminal event
    pub fn active(&self) -> &[SessionId] {
        &self.active
    }

    pub fn handle_text(&mut self, text: &str) {
        match ClientMessage::parse(text) {
            Ok(message) => self.handle(message),
            Err(e) => {
                debug!(connection = %self.id, "unreadable message: {}", e);
                self.reply(DebateEvent::Error {
                    message: format!("Invalid message: {e}"),
                });
            }
        }
    }

    pub fn handle(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::StartDebate {
                question,
                context,
                method,
            } => match Question::try_new(question) {
                Ok(question) => self.start(DebateSession::new(question, context, method)),
                Err(e) => self.reply(DebateEvent::Error {
                    message: e.to_string(),
                }),
            },
            ClientMessage::CancelDebate {
                session_id: Some(id),
            } => {
                if !self.active.contains(&id) || !self.state.registry.cancel(&id) {
                    self.reply(DebateEvent::Error {
                        message: format!("No running debate {id}"),
                    });
                }
            }
            ClientMessage::CancelDebate { session_id: None } => {
                for id in &self.active {
                    self.state.registry.cancel(id);
                }
            }
            ClientMessage::Ping => self.reply(DebateEvent::Pong),
        }
    }

    /// Track a delivered event; a terminal one ends its debate here.
    pub fn observe(&mut self, envelope: &EventEnvelope) {
        if envelope.event.is_terminal() {
            self.active.retain(|id| id != &envelope.session_id);
        }
    }

    /// Cancel every debate still running for this client.
    pub fn close(self) {
        for id in &self.active {
            self.state.registry.cancel(id);
            self.state.hub.detach(id);
        }
    }

    fn start(&mut self, session: DebateSession) {
        let id = session.id.clone();
        info!(connection = %self.id, session = %id, method = %session.method, "starting debate");

        self.state.hub.attach(id.clone(), self.outbox.clone());
        let token = self.state.registry.register(id.clone());
        self.active.push(id.clone());

        let use_case = Arc::clone(&self.state.use_case);
        let registry = Arc::clone(&self.state.registry);
        tokio::spawn(async move {
            use_case.execute(session, token).await;
            registry.remove(&id);
        });
    }

    fn reply(&self, event: DebateEvent) {
        if self
            .outbox
            .try_send(EventEnvelope::new(self.id.clone(), event))
            .is_err()
        {
            debug!(connection = %self.id, "outbox unavailable, reply dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::SessionHub;
    use async_trait::async_trait;
    use debate_application::{
        DebateConfig, GatewayError, LlmSession, NoRepository, RunDebateUseCase, SessionOptions,
    };
    use debate_domain::Provider;
    use std::time::Duration;
    use tokio::time::timeout;

    /// Gateway whose sessions never open
    struct StalledGateway;

    #[async_trait]
    impl LlmGateway for StalledGateway {
        async fn create_session(
            &self,
            _provider: &Provider,
            _options: &SessionOptions,
        ) -> Result<Box<dyn LlmSession>, GatewayError> {
            std::future::pending().await
        }

        fn available_providers(&self) -> Vec<Provider> {
            vec![Provider::Azure]
        }
    }

    fn connection(
        config: DebateConfig,
    ) -> (Connection<StalledGateway>, mpsc::Receiver<EventEnvelope>) {
        let hub = Arc::new(SessionHub::new());
        let use_case = RunDebateUseCase::new(Arc::new(StalledGateway), config)
            .with_emitter(hub.clone());
        let state = ServerState::new(
            Arc::new(use_case),
            hub,
            Arc::new(NoRepository),
            vec![Provider::Azure],
        );
        let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
        (Connection::new(state, tx), rx)
    }

    async fn next_event(rx: &mut mpsc::Receiver<EventEnvelope>) -> EventEnvelope {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event in time")
            .expect("outbox open")
    }

    /// Read until the first terminal event, tracking it on the connection.
    async fn until_terminal(
        connection: &mut Connection<StalledGateway>,
        rx: &mut mpsc::Receiver<EventEnvelope>,
    ) -> Vec<EventEnvelope> {
        let mut seen = Vec::new();
        loop {
            let envelope = next_event(rx).await;
            connection.observe(&envelope);
            let terminal = envelope.event.is_terminal();
            seen.push(envelope);
            if terminal {
                return seen;
            }
        }
    }

    #[tokio::test]
    async fn test_ping_gets_pong_on_connection_id() {
        let (mut connection, mut rx) = connection(DebateConfig::default());
        connection.handle_text(r#"{"type": "ping"}"#);

        let envelope = next_event(&mut rx).await;
        assert_eq!(envelope.event, DebateEvent::Pong);
        assert_eq!(&envelope.session_id, connection.id());
    }

    #[tokio::test]
    async fn test_bad_messages_are_answered_with_errors() {
        let (mut connection, mut rx) = connection(DebateConfig::default());

        connection.handle_text("{not json");
        connection.handle_text(r#"{"type": "start_debate", "question": "   "}"#);
        connection.handle_text(r#"{"type": "cancel_debate", "session_id": "nope"}"#);

        for _ in 0..3 {
            assert_eq!(next_event(&mut rx).await.event.name(), "error");
        }
        assert!(connection.active().is_empty());
    }

    #[tokio::test]
    async fn test_failed_precondition_reaches_the_client() {
        let config = DebateConfig::default().with_council(vec![Provider::Azure]);
        let (mut connection, mut rx) = connection(config);

        connection.handle_text(
            r#"{"type": "start_debate", "question": "Build it?", "method": "council"}"#,
        );
        assert_eq!(connection.active().len(), 1);

        let events = until_terminal(&mut connection, &mut rx).await;
        assert_eq!(events.len(), 1);
        let DebateEvent::Error { message } = &events[0].event else {
            panic!("expected error, got {:?}", events[0].event);
        };
        assert!(message.contains("at least 2"));
        assert!(connection.active().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_stops_a_running_debate() {
        let (mut connection, mut rx) = connection(DebateConfig::default());
        connection.handle_text(r#"{"type": "start_debate", "question": "Build it?"}"#);

        let started = next_event(&mut rx).await;
        assert_eq!(started.event.name(), "debate_started");
        let id = started.session_id.clone();
        assert_eq!(connection.active(), &[id.clone()]);

        connection.handle_text(&format!(
            r#"{{"type": "cancel_debate", "session_id": "{id}"}}"#
        ));

        let events = until_terminal(&mut connection, &mut rx).await;
        let last = events.last().unwrap();
        assert_eq!(last.event, DebateEvent::DebateCancelled);
        assert_eq!(last.session_id, id);
        assert!(events.iter().all(|e| e.event.name() != "final_decision"));
        assert!(connection.active().is_empty());
    }

    #[tokio::test]
    async fn test_close_cancels_everything_started_here() {
        let (mut connection, mut rx) = connection(DebateConfig::default());
        connection.handle_text(r#"{"type": "start_debate", "question": "Build it?"}"#);
        let started = next_event(&mut rx).await;

        let registry = Arc::clone(&connection.state.registry);
        let hub = Arc::clone(&connection.state.hub);
        assert!(registry.contains(&started.session_id));

        connection.close();
        assert!(!hub.is_attached(&started.session_id));

        // the debate settles and unregisters itself
        timeout(Duration::from_secs(5), async {
            while registry.contains(&started.session_id) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("debate unregistered");
    }
}

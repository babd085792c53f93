//! Test doubles shared by the use case tests: a scripted gateway and a
//! recording emitter.

use crate::ports::debate_repository::{DebateRepository, RepositoryError};
use crate::ports::event_emitter::EventEmitter;
use crate::ports::llm_gateway::{
    GatewayError, LlmGateway, LlmSession, SessionOptions, StreamHandle,
};
use async_trait::async_trait;
use debate_domain::{
    DebateEvent, DebateSession, DebateSummary, PromptTemplate, Provider, Role, SessionId,
    StreamEvent,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;

/// Which prompt a session was opened for, derived from its system prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Executive(Role),
    ConsensusSynthesis,
    Council,
    Review,
    Chairman,
}

impl Stage {
    fn from_options(options: &SessionOptions) -> Option<Stage> {
        let system = options.system_prompt.as_deref()?;
        if system == PromptTemplate::consensus_synthesis_system() {
            return Some(Stage::ConsensusSynthesis);
        }
        if system == PromptTemplate::council_system() {
            return Some(Stage::Council);
        }
        if system == PromptTemplate::review_system() {
            return Some(Stage::Review);
        }
        if system == PromptTemplate::chairman_system() {
            return Some(Stage::Chairman);
        }
        Role::DISCUSSION_ORDER
            .into_iter()
            .find(|role| system.contains(role.persona_name()))
            .map(Stage::Executive)
    }
}

type DynamicReply = Arc<dyn Fn(&str) -> Reply + Send + Sync>;

/// Scripted answer for one session
#[derive(Clone)]
pub enum Reply {
    /// Answered atomically
    Text(String),
    /// Streamed as deltas, then completed
    Stream(Vec<String>),
    /// Transport failure
    Fail(String),
    /// Never answers
    Hang,
    /// Chosen from the user prompt
    Dynamic(DynamicReply),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    pub fn stream(chunks: &[&str]) -> Self {
        Reply::Stream(chunks.iter().map(|c| c.to_string()).collect())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Reply::Fail(message.into())
    }

    pub fn hang() -> Self {
        Reply::Hang
    }

    pub fn dynamic(f: impl Fn(&str) -> Reply + Send + Sync + 'static) -> Self {
        Reply::Dynamic(Arc::new(f))
    }

    fn resolve(&self, prompt: &str) -> Reply {
        match self {
            Reply::Dynamic(f) => f(prompt).resolve(prompt),
            other => other.clone(),
        }
    }
}

#[derive(Default)]
pub struct MockGateway {
    staged: HashMap<(Provider, Stage), Reply>,
    defaults: HashMap<Provider, Reply>,
    calls: Arc<Mutex<Vec<(Provider, Option<Stage>)>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default reply for every session on `provider`
    pub fn reply(mut self, provider: Provider, reply: Reply) -> Self {
        self.defaults.insert(provider, reply);
        self
    }

    /// Reply for one stage on `provider`, overriding the default
    pub fn reply_at(mut self, provider: Provider, stage: Stage, reply: Reply) -> Self {
        self.staged.insert((provider, stage), reply);
        self
    }

    /// Handle on the log of opened sessions
    pub fn calls(&self) -> Arc<Mutex<Vec<(Provider, Option<Stage>)>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl LlmGateway for MockGateway {
    async fn create_session(
        &self,
        provider: &Provider,
        options: &SessionOptions,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        let stage = Stage::from_options(options);
        self.calls.lock().unwrap().push((provider.clone(), stage));
        let reply = stage
            .and_then(|s| self.staged.get(&(provider.clone(), s)))
            .or_else(|| self.defaults.get(provider))
            .cloned()
            .ok_or_else(|| GatewayError::ProviderNotAvailable(provider.to_string()))?;
        Ok(Box::new(MockSession {
            provider: provider.clone(),
            reply,
        }))
    }

    fn available_providers(&self) -> Vec<Provider> {
        let mut providers: Vec<Provider> = self.defaults.keys().cloned().collect();
        providers.sort();
        providers
    }
}

struct MockSession {
    provider: Provider,
    reply: Reply,
}

#[async_trait]
impl LlmSession for MockSession {
    fn provider(&self) -> &Provider {
        &self.provider
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        match self.reply.resolve(content) {
            Reply::Text(text) => Ok(text),
            Reply::Stream(chunks) => Ok(chunks.concat()),
            Reply::Fail(message) => Err(GatewayError::RequestFailed(message)),
            Reply::Hang | Reply::Dynamic(_) => std::future::pending().await,
        }
    }

    async fn send_streaming(&self, content: &str) -> Result<StreamHandle, GatewayError> {
        let (tx, rx) = mpsc::channel(32);
        match self.reply.resolve(content) {
            Reply::Text(text) => {
                let _ = tx.send(StreamEvent::Completed(text)).await;
            }
            Reply::Stream(chunks) => {
                let full = chunks.concat();
                tokio::spawn(async move {
                    for chunk in chunks {
                        if tx.send(StreamEvent::Delta(chunk)).await.is_err() {
                            return;
                        }
                    }
                    let _ = tx.send(StreamEvent::Completed(full)).await;
                });
            }
            Reply::Fail(message) => return Err(GatewayError::RequestFailed(message)),
            Reply::Hang | Reply::Dynamic(_) => {
                tokio::spawn(async move { tx.closed().await });
            }
        }
        Ok(StreamHandle::new(rx))
    }
}

/// Emitter that records every event and lets tests wait for one
#[derive(Default)]
pub struct RecordingEmitter {
    events: Mutex<Vec<(SessionId, DebateEvent)>>,
    notify: Notify,
}

impl RecordingEmitter {
    pub fn events(&self) -> Vec<DebateEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(DebateEvent::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().into_iter().filter(|n| *n == name).count()
    }

    pub fn terminal_count(&self) -> usize {
        self.events().iter().filter(|e| e.is_terminal()).count()
    }

    /// Resolve once an event named `name` has been emitted.
    pub async fn wait_for(&self, name: &str) {
        loop {
            let notified = self.notify.notified();
            if self.count(name) > 0 {
                return;
            }
            notified.await;
        }
    }
}

impl EventEmitter for RecordingEmitter {
    fn emit(&self, session_id: &SessionId, event: DebateEvent) {
        self.events
            .lock()
            .unwrap()
            .push((session_id.clone(), event));
        self.notify.notify_waiters();
    }
}

/// Records like [`RecordingEmitter`] and cancels `token` the moment an event
/// named `name` is emitted, from inside the emitting task.
pub struct CancellingEmitter {
    pub recorder: Arc<RecordingEmitter>,
    name: &'static str,
    token: CancellationToken,
}

impl CancellingEmitter {
    pub fn new(name: &'static str, token: CancellationToken) -> Self {
        Self {
            recorder: Arc::new(RecordingEmitter::default()),
            name,
            token,
        }
    }
}

impl EventEmitter for CancellingEmitter {
    fn emit(&self, session_id: &SessionId, event: DebateEvent) {
        let hit = event.name() == self.name;
        self.recorder.emit(session_id, event);
        if hit {
            self.token.cancel();
        }
    }
}

/// In-memory repository recording saved snapshots
#[derive(Default)]
pub struct MemoryRepository {
    pub saved: Mutex<Vec<DebateSession>>,
    pub notify: Notify,
}

impl MemoryRepository {
    pub async fn wait_for_save(&self) -> DebateSession {
        loop {
            let notified = self.notify.notified();
            if let Some(session) = self.saved.lock().unwrap().last().cloned() {
                return session;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl DebateRepository for MemoryRepository {
    async fn save(&self, session: &DebateSession) -> Result<(), RepositoryError> {
        self.saved.lock().unwrap().push(session.clone());
        self.notify.notify_waiters();
        Ok(())
    }

    async fn list(&self) -> Result<Vec<DebateSummary>, RepositoryError> {
        Ok(self
            .saved
            .lock()
            .unwrap()
            .iter()
            .map(DebateSession::summary)
            .collect())
    }

    async fn get(&self, id: &SessionId) -> Result<Option<DebateSession>, RepositoryError> {
        Ok(self
            .saved
            .lock()
            .unwrap()
            .iter()
            .find(|s| &s.id == id)
            .cloned())
    }
}

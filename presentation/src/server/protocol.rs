//! Messages a websocket client may send

use debate_domain::{DebateContext, DebateMethod, SessionId};
use serde::Deserialize;

/// One inbound websocket text message, tagged by `type`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    StartDebate {
        question: String,
        #[serde(default)]
        context: DebateContext,
        #[serde(default)]
        method: DebateMethod,
    },
    /// Without a session id, every debate of the connection is cancelled.
    CancelDebate {
        #[serde(default)]
        session_id: Option<SessionId>,
    },
    Ping,
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

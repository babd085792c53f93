//! Progress events streamed to clients while a debate runs
//!
//! Every event is delivered inside an [`EventEnvelope`] carrying the session
//! id and a timestamp. On the wire each envelope is one flat JSON object whose
//! `type` field names the event.

use super::comparison::ComparisonResult;
use super::consensus::ConsensusAnalysis;
use super::council::RatingMatrix;
use super::decision::{FinalDecision, Recommendation};
use super::divergence::DivergenceAnalysis;
use super::session::{DebateMethod, SessionId};
use super::task::Identity;
use crate::core::provider::Provider;
use crate::executive::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a task was handed when it started
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSummary {
    pub query_preview: String,
    pub context_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_concern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DebateEvent {
    DebateStarted {
        method: DebateMethod,
        question: String,
    },

    // Consensus path
    ExecStarted {
        role: Role,
        name: String,
        title: String,
        emoji: String,
        input_summary: InputSummary,
    },
    ExecStreaming {
        role: Role,
        token: String,
    },
    ExecComplete {
        role: Role,
        raw_output: String,
        parsed_output: Option<Value>,
    },
    ExecError {
        role: Role,
        error: String,
    },
    ConsensusUpdate {
        agreement_level: f64,
        analysis: ConsensusAnalysis,
    },
    FinalDecision {
        decision: FinalDecision,
    },

    // Council path
    CouncilDivergenceStart {
        provider: Provider,
        name: String,
        input_summary: InputSummary,
    },
    CouncilResponseStreaming {
        provider: Provider,
        token: String,
    },
    CouncilResponseComplete {
        provider: Provider,
        raw_output: String,
        parsed_output: Option<Value>,
    },
    CouncilResponseError {
        provider: Provider,
        error: String,
    },
    CouncilDivergenceAnalysis {
        analysis: DivergenceAnalysis,
    },
    CouncilPeerReviewStart {
        total_reviews: usize,
    },
    CouncilPeerReview {
        reviewer: Provider,
        target: Provider,
        score: f64,
    },
    CouncilRatingMatrix {
        matrix: RatingMatrix,
    },
    CouncilSynthesisStart {
        /// Highest-rated member; its answer leads the synthesis prompt
        chairman: Option<Provider>,
        /// Backend writing the synthesis
        synthesizer: Provider,
    },
    CouncilSynthesisStreaming {
        synthesizer: Provider,
        token: String,
    },
    CouncilFinalDecision {
        synthesizer: Provider,
        decision: FinalDecision,
    },

    // Method "both"
    ComparisonComplete {
        comparison: ComparisonResult,
    },

    // Terminal
    DebateComplete {
        method: DebateMethod,
        recommendation: Option<Recommendation>,
        confidence_level: Option<f64>,
    },
    DebateCancelled,
    Error {
        message: String,
    },

    Pong,
}

impl DebateEvent {
    /// Wire name of the event (`type` field)
    pub fn name(&self) -> &'static str {
        match self {
            DebateEvent::DebateStarted { .. } => "debate_started",
            DebateEvent::ExecStarted { .. } => "exec_started",
            DebateEvent::ExecStreaming { .. } => "exec_streaming",
            DebateEvent::ExecComplete { .. } => "exec_complete",
            DebateEvent::ExecError { .. } => "exec_error",
            DebateEvent::ConsensusUpdate { .. } => "consensus_update",
            DebateEvent::FinalDecision { .. } => "final_decision",
            DebateEvent::CouncilDivergenceStart { .. } => "council_divergence_start",
            DebateEvent::CouncilResponseStreaming { .. } => "council_response_streaming",
            DebateEvent::CouncilResponseComplete { .. } => "council_response_complete",
            DebateEvent::CouncilResponseError { .. } => "council_response_error",
            DebateEvent::CouncilDivergenceAnalysis { .. } => "council_divergence_analysis",
            DebateEvent::CouncilPeerReviewStart { .. } => "council_peer_review_start",
            DebateEvent::CouncilPeerReview { .. } => "council_peer_review",
            DebateEvent::CouncilRatingMatrix { .. } => "council_rating_matrix",
            DebateEvent::CouncilSynthesisStart { .. } => "council_synthesis_start",
            DebateEvent::CouncilSynthesisStreaming { .. } => "council_synthesis_streaming",
            DebateEvent::CouncilFinalDecision { .. } => "council_final_decision",
            DebateEvent::ComparisonComplete { .. } => "comparison_complete",
            DebateEvent::DebateComplete { .. } => "debate_complete",
            DebateEvent::DebateCancelled => "debate_cancelled",
            DebateEvent::Error { .. } => "error",
            DebateEvent::Pong => "pong",
        }
    }

    /// Exactly one terminal event is emitted per session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DebateEvent::DebateComplete { .. } | DebateEvent::DebateCancelled | DebateEvent::Error { .. }
        )
    }

    /// Per-token streaming events
    pub fn is_token(&self) -> bool {
        matches!(
            self,
            DebateEvent::ExecStreaming { .. }
                | DebateEvent::CouncilResponseStreaming { .. }
                | DebateEvent::CouncilSynthesisStreaming { .. }
        )
    }

    /// Task started event for an identity
    pub fn task_started(identity: &Identity, input_summary: InputSummary) -> Self {
        match identity {
            Identity::Role(role) => DebateEvent::ExecStarted {
                role: *role,
                name: role.persona_name().to_string(),
                title: role.title().to_string(),
                emoji: role.emoji().to_string(),
                input_summary,
            },
            Identity::Provider(provider) => DebateEvent::CouncilDivergenceStart {
                provider: provider.clone(),
                name: provider.display_name().to_string(),
                input_summary,
            },
        }
    }

    pub fn task_token(identity: &Identity, token: impl Into<String>) -> Self {
        let token = token.into();
        match identity {
            Identity::Role(role) => DebateEvent::ExecStreaming { role: *role, token },
            Identity::Provider(provider) => DebateEvent::CouncilResponseStreaming {
                provider: provider.clone(),
                token,
            },
        }
    }

    pub fn task_complete(
        identity: &Identity,
        raw_output: impl Into<String>,
        parsed_output: Option<Value>,
    ) -> Self {
        let raw_output = raw_output.into();
        match identity {
            Identity::Role(role) => DebateEvent::ExecComplete {
                role: *role,
                raw_output,
                parsed_output,
            },
            Identity::Provider(provider) => DebateEvent::CouncilResponseComplete {
                provider: provider.clone(),
                raw_output,
                parsed_output,
            },
        }
    }

    pub fn task_error(identity: &Identity, error: impl Into<String>) -> Self {
        let error = error.into();
        match identity {
            Identity::Role(role) => DebateEvent::ExecError { role: *role, error },
            Identity::Provider(provider) => DebateEvent::CouncilResponseError {
                provider: provider.clone(),
                error,
            },
        }
    }
}

/// An event addressed to one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: DebateEvent,
}

impl EventEnvelope {
    pub fn new(session_id: SessionId, event: DebateEvent) -> Self {
        Self {
            session_id,
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

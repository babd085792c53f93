//! Debate session aggregate

use super::comparison::ComparisonResult;
use super::consensus::ConsensusAnalysis;
use super::council::RatingMatrix;
use super::decision::{FinalDecision, Recommendation};
use super::divergence::DivergenceAnalysis;
use super::task::{Task, TaskPhase};
use crate::core::error::DomainError;
use crate::core::provider::Provider;
use crate::core::question::Question;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Free-form company context attached to a question
pub type DebateContext = Map<String, Value>;

/// Aggregation strategy requested for a debate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebateMethod {
    /// Four executives on one provider, scored by the recommendation lexicon
    #[default]
    Consensus,
    /// Every provider answers, reviews its peers, and a chairman synthesizes
    Council,
    /// Both of the above, concurrently, followed by a comparison
    Both,
}

impl DebateMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebateMethod::Consensus => "consensus",
            DebateMethod::Council => "council",
            DebateMethod::Both => "both",
        }
    }

    pub fn runs_consensus(&self) -> bool {
        matches!(self, DebateMethod::Consensus | DebateMethod::Both)
    }

    pub fn runs_council(&self) -> bool {
        matches!(self, DebateMethod::Council | DebateMethod::Both)
    }
}

impl std::fmt::Display for DebateMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DebateMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "consensus" => Ok(DebateMethod::Consensus),
            "council" => Ok(DebateMethod::Council),
            "both" => Ok(DebateMethod::Both),
            other => Err(DomainError::UnknownMethod(other.to_string())),
        }
    }
}

/// Short opaque session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    const LEN: usize = 12;

    pub fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(Self::LEN);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Completed,
    Cancelled,
    Failed(String),
}

impl SessionStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, SessionStatus::Running)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Failed(_) => "failed",
        }
    }
}

/// Root aggregate for one debate request
///
/// Decisions are only set after every task of the relevant set is terminal
/// and its metric has been computed; the coordinators enforce this ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateSession {
    pub id: SessionId,
    pub query: Question,
    #[serde(default)]
    pub context: DebateContext,
    pub method: DebateMethod,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consensus: Option<ConsensusAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divergence: Option<DivergenceAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_matrix: Option<RatingMatrix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chairman: Option<Provider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesizer: Option<Provider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consensus_decision: Option<FinalDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub council_decision: Option<FinalDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonResult>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl DebateSession {
    pub fn new(query: Question, context: DebateContext, method: DebateMethod) -> Self {
        Self::with_id(SessionId::generate(), query, context, method)
    }

    pub fn with_id(
        id: SessionId,
        query: Question,
        context: DebateContext,
        method: DebateMethod,
    ) -> Self {
        Self {
            id,
            query,
            context,
            method,
            tasks: Vec::new(),
            consensus: None,
            divergence: None,
            rating_matrix: None,
            chairman: None,
            synthesizer: None,
            consensus_decision: None,
            council_decision: None,
            comparison: None,
            status: SessionStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Executive tasks, in insertion order
    pub fn role_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.identity.role().is_some())
    }

    /// Council provider tasks, in insertion order
    pub fn provider_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.identity.provider().is_some())
    }

    pub fn task(&self, key: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.identity.key() == key)
    }

    /// Decision of the active method; the consensus decision for `both`
    pub fn final_decision(&self) -> Option<&FinalDecision> {
        match self.method {
            DebateMethod::Consensus | DebateMethod::Both => self.consensus_decision.as_ref(),
            DebateMethod::Council => self.council_decision.as_ref(),
        }
    }

    pub fn recommendation(&self) -> Option<Recommendation> {
        self.final_decision().map(|d| d.recommendation)
    }

    pub fn confidence_level(&self) -> Option<f64> {
        self.final_decision().map(|d| d.confidence_level)
    }

    /// Consensus agreement level, or council alignment for council-only runs
    pub fn agreement_level(&self) -> Option<f64> {
        self.consensus
            .as_ref()
            .map(|c| c.agreement_level)
            .or_else(|| self.rating_matrix.as_ref().map(|m| m.alignment))
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn mark_completed(&mut self) {
        self.finish(SessionStatus::Completed);
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.finish(SessionStatus::Failed(message.into()));
    }

    /// Stop the session; any task not yet terminal becomes a cancelled error.
    pub fn mark_cancelled(&mut self) {
        for task in &mut self.tasks {
            task.cancel();
        }
        self.finish(SessionStatus::Cancelled);
    }

    fn finish(&mut self, status: SessionStatus) {
        if self.status.is_finished() {
            return;
        }
        self.status = status;
        self.completed_at = Some(Utc::now());
    }

    pub fn summary(&self) -> DebateSummary {
        DebateSummary {
            id: self.id.clone(),
            question: self.query.preview(),
            method: self.method,
            status: self.status.label().to_string(),
            recommendation: self.recommendation(),
            confidence_level: self.confidence_level(),
            agreement_level: self.agreement_level(),
            task_errors: self
                .tasks
                .iter()
                .filter(|t| t.phase == TaskPhase::Error)
                .count(),
            started_at: self.started_at,
        }
    }
}

/// History listing entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateSummary {
    pub id: SessionId,
    pub question: String,
    pub method: DebateMethod,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement_level: Option<f64>,
    pub task_errors: usize,
    pub started_at: DateTime<Utc>,
}

//! Generation task entity and its phase machine

use crate::core::provider::Provider;
use crate::executive::{Role, StructuredOutput};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who a task speaks for: an executive seat or a council provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    Role(Role),
    Provider(Provider),
}

impl Identity {
    /// Stable key used in events, maps and history ("cfo", "anthropic", ...)
    pub fn key(&self) -> &str {
        match self {
            Identity::Role(role) => role.as_str(),
            Identity::Provider(provider) => provider.as_str(),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Identity::Role(role) => format!("{} {}", role.emoji(), role.persona_name()),
            Identity::Provider(provider) => provider.display_name().to_string(),
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Identity::Role(role) => Some(*role),
            Identity::Provider(_) => None,
        }
    }

    pub fn provider(&self) -> Option<&Provider> {
        match self {
            Identity::Role(_) => None,
            Identity::Provider(provider) => Some(provider),
        }
    }

    /// Decode raw text into the schema this identity is expected to produce.
    pub fn parse_output(&self, raw: &str) -> StructuredOutput {
        match self {
            Identity::Role(role) => StructuredOutput::parse_role(*role, raw),
            Identity::Provider(_) => StructuredOutput::parse_provider(raw),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl From<Role> for Identity {
    fn from(role: Role) -> Self {
        Identity::Role(role)
    }
}

impl From<Provider> for Identity {
    fn from(provider: Provider) -> Self {
        Identity::Provider(provider)
    }
}

/// Task lifecycle: `Pending -> Starting -> Streaming -> {Complete | Error}`
///
/// `Streaming` is skipped by backends that answer atomically. Both terminal
/// phases are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    Pending,
    Starting,
    Streaming,
    Complete,
    Error,
}

impl TaskPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskPhase::Complete | TaskPhase::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPhase::Pending => "pending",
            TaskPhase::Starting => "starting",
            TaskPhase::Streaming => "streaming",
            TaskPhase::Complete => "complete",
            TaskPhase::Error => "error",
        }
    }
}

/// Error detail recorded on tasks stopped by cancellation
pub const CANCELLED_DETAIL: &str = "cancelled";

/// One generation unit bound to an identity (Entity)
///
/// Owned and mutated by exactly one executor, which hands it back once
/// terminal. Transition methods are no-ops on terminal tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub identity: Identity,
    pub phase: TaskPhase,
    /// Accumulated text; absent when the call itself failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<StructuredOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn pending(identity: impl Into<Identity>) -> Self {
        Self {
            identity: identity.into(),
            phase: TaskPhase::Pending,
            raw_output: None,
            output: None,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn start(&mut self) {
        if self.phase == TaskPhase::Pending {
            self.phase = TaskPhase::Starting;
            self.started_at = Some(Utc::now());
        }
    }

    /// Record that the first token arrived.
    pub fn mark_streaming(&mut self) {
        if matches!(self.phase, TaskPhase::Pending | TaskPhase::Starting) {
            if self.started_at.is_none() {
                self.started_at = Some(Utc::now());
            }
            self.phase = TaskPhase::Streaming;
        }
    }

    /// Finish with the full text; decoding never fails the task.
    pub fn complete(&mut self, raw: String) {
        if self.is_terminal() {
            return;
        }
        self.output = Some(self.identity.parse_output(&raw));
        self.raw_output = Some(raw);
        self.phase = TaskPhase::Complete;
        self.completed_at = Some(Utc::now());
    }

    /// Finish with an error. Partial text is discarded.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        self.raw_output = None;
        self.output = None;
        self.error = Some(error.into());
        self.phase = TaskPhase::Error;
        self.completed_at = Some(Utc::now());
    }

    pub fn cancel(&mut self) {
        self.fail(CANCELLED_DETAIL);
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn is_complete(&self) -> bool {
        self.phase == TaskPhase::Complete
    }

    /// Structured output, or `None` when the task failed or the text did not decode.
    pub fn parsed_output(&self) -> Option<&StructuredOutput> {
        self.output.as_ref().filter(|o| !o.is_raw_fallback())
    }

    pub fn recommendation(&self) -> Option<&str> {
        self.parsed_output().and_then(StructuredOutput::recommendation)
    }

    pub fn confidence(&self) -> Option<f64> {
        self.parsed_output().and_then(StructuredOutput::confidence)
    }

    /// Text used when this task's result is quoted in a later prompt
    pub fn prompt_text(&self) -> Option<String> {
        if !self.is_complete() {
            return None;
        }
        self.output.as_ref().map(StructuredOutput::prompt_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_happy_path() {
        let mut task = Task::pending(Role::Cfo);
        task.start();
        assert_eq!(task.phase, TaskPhase::Starting);
        task.mark_streaming();
        task.complete(r#"{"financial_recommendation": "proceed"}"#.to_string());

        assert_eq!(task.phase, TaskPhase::Complete);
        assert!(task.started_at.is_some());
        assert!(task.completed_at.is_some());
        assert_eq!(task.recommendation(), Some("proceed"));
    }

    #[test]
    fn test_unparseable_output_completes_without_parsed_output() {
        let mut task = Task::pending(Role::Cto);
        task.start();
        task.complete("no json here".to_string());

        assert_eq!(task.phase, TaskPhase::Complete);
        assert!(task.parsed_output().is_none());
        assert_eq!(task.raw_output.as_deref(), Some("no json here"));
        assert_eq!(task.prompt_text().as_deref(), Some("no json here"));
    }

    #[test]
    fn test_failure_has_no_raw_output() {
        let mut task = Task::pending(Provider::Google);
        task.start();
        task.mark_streaming();
        task.fail("connection reset");

        assert_eq!(task.phase, TaskPhase::Error);
        assert!(task.raw_output.is_none());
        assert_eq!(task.error.as_deref(), Some("connection reset"));
        assert!(task.prompt_text().is_none());
    }

    #[test]
    fn test_terminal_phases_are_absorbing() {
        let mut task = Task::pending(Role::Cro);
        task.complete(r#"{"revenue_recommendation": "neutral"}"#.to_string());
        task.cancel();
        task.mark_streaming();
        assert_eq!(task.phase, TaskPhase::Complete);
        assert!(task.error.is_none());

        let mut task = Task::pending(Role::Cpo);
        task.cancel();
        task.complete("{}".to_string());
        assert_eq!(task.phase, TaskPhase::Error);
        assert_eq!(task.error.as_deref(), Some(CANCELLED_DETAIL));
    }

    #[test]
    fn test_identity_keys() {
        assert_eq!(Identity::from(Role::Cpo).key(), "cpo");
        assert_eq!(Identity::from(Provider::Anthropic).key(), "anthropic");
        assert!(matches!(
            Identity::from(Provider::Azure).parse_output("{\"recommendation\": \"GO\"}"),
            StructuredOutput::Provider(_)
        ));
    }
}

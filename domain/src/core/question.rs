//! Question value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// The decision under review (Value Object)
///
/// Every executive and every council provider receives the same question,
/// together with the free-form company context of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Question {
    content: String,
}

impl Question {
    /// Try to create a new question, rejecting empty or whitespace-only input
    pub fn try_new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::InvalidQuestion(
                "question cannot be empty".to_string(),
            ));
        }
        Ok(Self { content })
    }

    /// Get the question content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Short preview used in `exec_started` input summaries.
    ///
    /// Keeps the first 100 characters and appends `...` when truncated.
    pub fn preview(&self) -> String {
        const LIMIT: usize = 100;
        if self.content.chars().count() <= LIMIT {
            return self.content.clone();
        }
        let head: String = self.content.chars().take(LIMIT).collect();
        format!("{head}...")
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl TryFrom<&str> for Question {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Question::try_new(s)
    }
}

impl TryFrom<String> for Question {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Question::try_new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_creation() {
        let q = Question::try_new("Should we build an AI copilot?").unwrap();
        assert_eq!(q.content(), "Should we build an AI copilot?");
    }

    #[test]
    fn test_empty_question_rejected() {
        assert!(Question::try_new("").is_err());
        assert!(Question::try_new("   \n").is_err());
    }

    #[test]
    fn test_preview_truncates_long_questions() {
        let long = "x".repeat(150);
        let q = Question::try_new(long).unwrap();
        let preview = q.preview();
        assert_eq!(preview.len(), 103);
        assert!(preview.ends_with("..."));

        let short = Question::try_new("Launch in EU?").unwrap();
        assert_eq!(short.preview(), "Launch in EU?");
    }
}

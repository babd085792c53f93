//! Debate history port

use async_trait::async_trait;
use debate_domain::{DebateSession, DebateSummary, SessionId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("History is disabled")]
    Disabled,
}

/// Persistence of finished debate snapshots
#[async_trait]
pub trait DebateRepository: Send + Sync {
    /// Store (or overwrite) a snapshot
    async fn save(&self, session: &DebateSession) -> Result<(), RepositoryError>;

    /// Summaries, newest first
    async fn list(&self) -> Result<Vec<DebateSummary>, RepositoryError>;

    async fn get(&self, id: &SessionId) -> Result<Option<DebateSession>, RepositoryError>;
}

/// Repository used when history is disabled: saves are dropped, reads are empty.
pub struct NoRepository;

#[async_trait]
impl DebateRepository for NoRepository {
    async fn save(&self, _session: &DebateSession) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list(&self) -> Result<Vec<DebateSummary>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn get(&self, _id: &SessionId) -> Result<Option<DebateSession>, RepositoryError> {
        Ok(None)
    }
}

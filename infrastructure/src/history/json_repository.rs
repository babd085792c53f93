//! One pretty-printed JSON file per finished debate.

use async_trait::async_trait;
use debate_application::{DebateRepository, RepositoryError};
use debate_domain::{DebateSession, DebateSummary, SessionId};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Repository storing snapshots as `<dir>/<session id>.json`
pub struct JsonFileDebateRepository {
    dir: PathBuf,
}

impl JsonFileDebateRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot path for `id`; `None` for ids that are not plain file names
    fn path_for(&self, id: &SessionId) -> Option<PathBuf> {
        let id = id.as_str();
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        safe.then(|| self.dir.join(format!("{id}.json")))
    }

    async fn read(path: &Path) -> Result<DebateSession, RepositoryError> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl DebateRepository for JsonFileDebateRepository {
    async fn save(&self, session: &DebateSession) -> Result<(), RepositoryError> {
        let path = self.path_for(&session.id).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("unsafe session id: {}", session.id),
            )
        })?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let content = serde_json::to_string_pretty(session)?;

        // write then rename so readers never see a half-written file
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), "debate snapshot saved");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<DebateSummary>, RepositoryError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path).await {
                Ok(session) => summaries.push(session.summary()),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable snapshot"),
            }
        }
        summaries.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(summaries)
    }

    async fn get(&self, id: &SessionId) -> Result<Option<DebateSession>, RepositoryError> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };
        match Self::read(&path).await {
            Ok(session) => Ok(Some(session)),
            Err(RepositoryError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_domain::{
        DebateContext, DebateMethod, FinalDecision, Question, Recommendation, Role, Task,
    };

    fn finished_session(id: &str, question: &str) -> DebateSession {
        let mut session = DebateSession::with_id(
            SessionId::from(id),
            Question::try_new(question).unwrap(),
            DebateContext::new(),
            DebateMethod::Consensus,
        );
        let mut task = Task::pending(Role::Cfo);
        task.start();
        task.complete(r#"{"financial_recommendation": "proceed", "confidence_level": 70}"#.into());
        session.tasks.push(task);
        session.consensus_decision = Some(FinalDecision::new(
            Recommendation::Go,
            81.0,
            "Launch to a pilot cohort",
        ));
        session.mark_completed();
        session
    }

    #[tokio::test]
    async fn test_save_and_reload_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileDebateRepository::new(dir.path().join("history"));
        let session = finished_session("abc123", "Launch the API tier?");

        repo.save(&session).await.unwrap();
        let loaded = repo.get(&session.id).await.unwrap().unwrap();

        assert_eq!(loaded.recommendation(), Some(Recommendation::Go));
        assert_eq!(loaded.confidence_level(), Some(81.0));
        let task = loaded.task("cfo").unwrap();
        assert_eq!(task.recommendation(), Some("proceed"));
        assert_eq!(task.parsed_output(), session.task("cfo").unwrap().parsed_output());
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileDebateRepository::new(dir.path());
        let mut older = finished_session("older", "First question?");
        older.started_at -= chrono::Duration::hours(1);
        let newer = finished_session("newer", "Second question?");
        repo.save(&older).await.unwrap();
        repo.save(&newer).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();

        let list = repo.list().await.unwrap();
        let ids: Vec<&str> = list.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_missing_dir_and_unknown_ids() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileDebateRepository::new(dir.path().join("never-created"));
        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.get(&SessionId::from("nope")).await.unwrap().is_none());
        assert!(repo.get(&SessionId::from("../etc/passwd")).await.unwrap().is_none());
    }
}

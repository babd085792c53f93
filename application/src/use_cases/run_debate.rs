//! Run Debate use case
//!
//! Dispatches one [`DebateSession`] to the consensus path, the council path or
//! both, then settles it: exactly one terminal event is emitted per session and
//! the finished snapshot is handed to the repository in the background.

use super::executor::RunContext;
use super::run_consensus::ConsensusRunner;
use super::run_council::{CouncilRunner, check_council};
use super::synthesize::SynthesisError;
use crate::config::DebateConfig;
use crate::ports::debate_repository::{DebateRepository, NoRepository};
use crate::ports::event_emitter::{EventEmitter, NoEmitter};
use crate::ports::llm_gateway::LlmGateway;
use debate_domain::{
    ComparisonResult, CostEstimate, DebateEvent, DebateMethod, DebateSession, DomainError,
};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Errors that end a debate session
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunDebateError {
    #[error("No council providers configured")]
    NoProviders,

    #[error("Council needs at least {required} providers, {available} enabled")]
    NotEnoughProviders { required: usize, available: usize },

    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Debate cancelled")]
    Cancelled,

    #[error("Invalid question: {0}")]
    InvalidQuestion(#[from] DomainError),
}

impl From<SynthesisError> for RunDebateError {
    fn from(e: SynthesisError) -> Self {
        match e {
            SynthesisError::Cancelled => RunDebateError::Cancelled,
            other => RunDebateError::SynthesisFailed(other.to_string()),
        }
    }
}

/// Use case for running one debate to its terminal state
pub struct RunDebateUseCase<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    emitter: Arc<dyn EventEmitter>,
    repository: Arc<dyn DebateRepository>,
    config: DebateConfig,
    saves: Mutex<Vec<JoinHandle<()>>>,
}

impl<G: LlmGateway + 'static> RunDebateUseCase<G> {
    pub fn new(gateway: Arc<G>, config: DebateConfig) -> Self {
        Self {
            gateway,
            emitter: Arc::new(NoEmitter),
            repository: Arc::new(NoRepository),
            config,
            saves: Mutex::new(Vec::new()),
        }
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn DebateRepository>) -> Self {
        self.repository = repository;
        self
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    /// Rough call count and cost of running `method` with the current config
    pub fn estimate(&self, method: DebateMethod) -> CostEstimate {
        CostEstimate::for_method(
            method,
            &self.config.consensus_provider,
            &self.config.council_providers,
        )
    }

    /// Run `session` until it completes, fails or `cancellation` fires.
    ///
    /// Never returns an error: the outcome is recorded in the returned
    /// session's status and announced by its terminal event.
    pub async fn execute(
        &self,
        mut session: DebateSession,
        cancellation: CancellationToken,
    ) -> DebateSession {
        let gateway: Arc<dyn LlmGateway> = self.gateway.clone();
        let ctx = RunContext {
            session_id: session.id.clone(),
            gateway,
            emitter: Arc::clone(&self.emitter),
            cancellation,
        };

        info!(
            session = %session.id,
            method = %session.method,
            "Starting debate: {}",
            session.query.preview()
        );

        let outcome = self.run(&ctx, &mut session).await;
        self.settle(&ctx, &mut session, outcome);
        self.persist(&session);
        session
    }

    /// Wait for background snapshot saves started so far.
    pub async fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = match self.saves.lock() {
            Ok(mut saves) => saves.drain(..).collect(),
            Err(_) => return,
        };
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("snapshot save task failed: {}", e);
            }
        }
    }

    async fn run(
        &self,
        ctx: &RunContext,
        session: &mut DebateSession,
    ) -> Result<(), RunDebateError> {
        if session.method.runs_council() {
            check_council(&self.config)?;
        }

        ctx.emit(DebateEvent::DebateStarted {
            method: session.method,
            question: session.query.content().to_string(),
        });

        let question = session.query.clone();
        let context = session.context.clone();
        let consensus = ConsensusRunner::new(&self.config);
        let council = CouncilRunner::new(&self.config);

        match session.method {
            DebateMethod::Consensus => consensus
                .run(ctx, &question, &context)
                .await
                .apply(session),
            DebateMethod::Council => council.run(ctx, &question, &context).await.apply(session),
            DebateMethod::Both => {
                let (consensus_run, council_run) = tokio::join!(
                    consensus.run(ctx, &question, &context),
                    council.run(ctx, &question, &context)
                );
                let consensus_result = consensus_run.apply(session);
                let council_result = council_run.apply(session);
                if ctx.is_cancelled() {
                    return Err(RunDebateError::Cancelled);
                }
                consensus_result?;
                council_result?;

                if let (Some(consensus), Some(council)) =
                    (&session.consensus_decision, &session.council_decision)
                {
                    let comparison = ComparisonResult::compare(consensus, council);
                    info!(
                        session = %ctx.session_id,
                        matched = comparison.recommendations_match,
                        "methods compared"
                    );
                    ctx.emit(DebateEvent::ComparisonComplete {
                        comparison: comparison.clone(),
                    });
                    session.comparison = Some(comparison);
                }
                Ok(())
            }
        }
    }

    /// Record the outcome on the session and emit its single terminal event.
    fn settle(
        &self,
        ctx: &RunContext,
        session: &mut DebateSession,
        outcome: Result<(), RunDebateError>,
    ) {
        // a token fired during the last await still counts as cancellation
        let outcome = match outcome {
            Ok(()) if ctx.is_cancelled() => Err(RunDebateError::Cancelled),
            other => other,
        };

        match outcome {
            Ok(()) => {
                session.mark_completed();
                info!(
                    session = %session.id,
                    recommendation = ?session.recommendation(),
                    confidence = ?session.confidence_level(),
                    "Debate complete"
                );
                ctx.emit(DebateEvent::DebateComplete {
                    method: session.method,
                    recommendation: session.recommendation(),
                    confidence_level: session.confidence_level(),
                });
            }
            Err(RunDebateError::Cancelled) => {
                session.mark_cancelled();
                info!(session = %session.id, "Debate cancelled");
                ctx.emit(DebateEvent::DebateCancelled);
            }
            Err(e) => {
                error!(session = %session.id, error = %e, "Debate failed");
                session.mark_failed(e.to_string());
                ctx.emit(DebateEvent::Error {
                    message: e.to_string(),
                });
            }
        }
    }

    fn persist(&self, session: &DebateSession) {
        let repository = Arc::clone(&self.repository);
        let snapshot = session.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = repository.save(&snapshot).await {
                warn!(session = %snapshot.id, error = %e, "Failed to save debate snapshot");
            }
        });
        if let Ok(mut saves) = self.saves.lock() {
            saves.retain(|h| !h.is_finished());
            saves.push(handle);
        }
    }
}

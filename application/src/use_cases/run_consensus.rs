//! Consensus path: four executives, one agreement metric, one synthesis

use super::executor::{FanOut, RunContext, TaskSpec, fan_out};
use super::run_debate::RunDebateError;
use super::synthesize::synthesize;
use crate::config::DebateConfig;
use debate_domain::{
    ConsensusAnalysis, ConsensusEvaluator, DebateContext, DebateEvent, DebateSession,
    FinalDecision, PromptTemplate, Question, Role, Task,
};
use tracing::info;

/// Everything the consensus path produced, including partial results on failure
#[derive(Debug)]
pub struct ConsensusRun {
    pub tasks: Vec<Task>,
    pub analysis: Option<ConsensusAnalysis>,
    pub decision: Option<FinalDecision>,
    pub result: Result<(), RunDebateError>,
}

impl ConsensusRun {
    /// Move the results into the session and return the path's outcome.
    pub fn apply(self, session: &mut DebateSession) -> Result<(), RunDebateError> {
        session.tasks.extend(self.tasks);
        session.consensus = self.analysis;
        session.consensus_decision = self.decision;
        self.result
    }
}

pub struct ConsensusRunner<'a> {
    config: &'a DebateConfig,
}

impl<'a> ConsensusRunner<'a> {
    pub fn new(config: &'a DebateConfig) -> Self {
        Self { config }
    }

    pub async fn run(
        &self,
        ctx: &RunContext,
        question: &Question,
        context: &DebateContext,
    ) -> ConsensusRun {
        let provider = &self.config.consensus_provider;
        info!(session = %ctx.session_id, provider = %provider, "consensus: executives");

        let specs = Role::DISCUSSION_ORDER
            .into_iter()
            .map(|role| TaskSpec::for_role(role, provider, question, context))
            .collect();
        let tasks = match fan_out(ctx, specs).await {
            FanOut::Completed(tasks) => tasks,
            FanOut::Cancelled(tasks) => {
                return ConsensusRun {
                    tasks,
                    analysis: None,
                    decision: None,
                    result: Err(RunDebateError::Cancelled),
                };
            }
        };

        let analysis =
            ConsensusEvaluator::new(self.config.synthesis_threshold).evaluate(&tasks);
        info!(
            session = %ctx.session_id,
            agreement = analysis.agreement_level,
            next_action = ?analysis.next_action,
            "consensus: evaluated"
        );
        ctx.emit(DebateEvent::ConsensusUpdate {
            agreement_level: analysis.agreement_level,
            analysis: analysis.clone(),
        });
        if !analysis.should_synthesize() {
            // no refinement round; the facilitator sees the low agreement in its prompt
            info!(session = %ctx.session_id, "consensus: low agreement, synthesizing anyway");
        }

        let prompt =
            PromptTemplate::consensus_synthesis(question.content(), context, &tasks, &analysis);
        let decision = synthesize(
            ctx,
            provider,
            PromptTemplate::consensus_synthesis_system(),
            &prompt,
            |_| {},
        )
        .await;

        match decision {
            Ok(decision) => {
                ctx.emit(DebateEvent::FinalDecision {
                    decision: decision.clone(),
                });
                ConsensusRun {
                    tasks,
                    analysis: Some(analysis),
                    decision: Some(decision),
                    result: Ok(()),
                }
            }
            Err(e) => ConsensusRun {
                tasks,
                analysis: Some(analysis),
                decision: None,
                result: Err(e.into()),
            },
        }
    }
}

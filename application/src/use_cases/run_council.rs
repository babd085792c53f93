//! Council path: independent answers, anonymous peer review, chairman synthesis

use super::executor::{FanOut, RunContext, TaskSpec, fan_out};
use super::generation::{GenerationError, open_session, send_with_cancellation};
use super::run_debate::RunDebateError;
use super::synthesize::synthesize;
use crate::config::DebateConfig;
use crate::ports::llm_gateway::SessionOptions;
use debate_domain::{
    DebateContext, DebateEvent, DebateSession, DivergenceAnalysis, FinalDecision, PeerReview,
    PromptTemplate, Provider, Question, RatingMatrix, Task, anonymous_label, parse_peer_review,
    select_synthesizer,
};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Everything the council path produced, including partial results on failure
#[derive(Debug)]
pub struct CouncilRun {
    pub tasks: Vec<Task>,
    pub divergence: Option<DivergenceAnalysis>,
    pub rating_matrix: Option<RatingMatrix>,
    /// Highest-rated member
    pub chairman: Option<Provider>,
    /// Backend that wrote the synthesis
    pub synthesizer: Option<Provider>,
    pub decision: Option<FinalDecision>,
    pub result: Result<(), RunDebateError>,
}

impl CouncilRun {
    fn stopped(tasks: Vec<Task>, error: RunDebateError) -> Self {
        Self {
            tasks,
            divergence: None,
            rating_matrix: None,
            chairman: None,
            synthesizer: None,
            decision: None,
            result: Err(error),
        }
    }

    /// Move the results into the session and return the path's outcome.
    pub fn apply(self, session: &mut DebateSession) -> Result<(), RunDebateError> {
        session.tasks.extend(self.tasks);
        session.divergence = self.divergence;
        session.rating_matrix = self.rating_matrix;
        session.chairman = self.chairman;
        session.synthesizer = self.synthesizer;
        session.council_decision = self.decision;
        self.result
    }
}

/// Check the council line-up before any call is made.
pub fn check_council(config: &DebateConfig) -> Result<(), RunDebateError> {
    let available = config.council_providers.len();
    if available == 0 {
        return Err(RunDebateError::NoProviders);
    }
    if available < config.min_council_providers {
        return Err(RunDebateError::NotEnoughProviders {
            required: config.min_council_providers,
            available,
        });
    }
    Ok(())
}

/// One pending review: `reviewer` scores the answer of `target`
struct ReviewJob {
    reviewer: Provider,
    target: Provider,
    label: String,
    response: String,
}

pub struct CouncilRunner<'a> {
    config: &'a DebateConfig,
}

impl<'a> CouncilRunner<'a> {
    pub fn new(config: &'a DebateConfig) -> Self {
        Self { config }
    }

    pub async fn run(
        &self,
        ctx: &RunContext,
        question: &Question,
        context: &DebateContext,
    ) -> CouncilRun {
        if let Err(e) = check_council(self.config) {
            return CouncilRun::stopped(Vec::new(), e);
        }
        let providers = &self.config.council_providers;

        // Round 1: divergence
        info!(session = %ctx.session_id, providers = providers.len(), "council: divergence");
        let specs = providers
            .iter()
            .map(|p| TaskSpec::for_provider(p, question, context))
            .collect();
        let tasks = match fan_out(ctx, specs).await {
            FanOut::Completed(tasks) => tasks,
            FanOut::Cancelled(tasks) => return CouncilRun::stopped(tasks, RunDebateError::Cancelled),
        };

        let divergence = DivergenceAnalysis::analyze(&tasks);
        ctx.emit(DebateEvent::CouncilDivergenceAnalysis {
            analysis: divergence.clone(),
        });

        // Round 2: peer review
        let Some(reviews) = self.peer_review(ctx, question, context, &tasks).await else {
            let mut run = CouncilRun::stopped(tasks, RunDebateError::Cancelled);
            run.divergence = Some(divergence);
            return run;
        };
        let matrix = RatingMatrix::aggregate(providers, reviews);
        info!(
            session = %ctx.session_id,
            reviews = matrix.reviews.len(),
            highest = ?matrix.highest_rated,
            variance = matrix.score_variance,
            "council: ratings aggregated"
        );
        ctx.emit(DebateEvent::CouncilRatingMatrix {
            matrix: matrix.clone(),
        });

        // Round 3: synthesis led by the highest-rated answer
        let chairman = matrix.highest_rated.clone();
        let synthesizer =
            select_synthesizer(providers, self.config.chairman_provider.as_ref(), &matrix);
        let Some(synthesizer) = synthesizer else {
            let mut run = CouncilRun::stopped(tasks, RunDebateError::NoProviders);
            run.divergence = Some(divergence);
            run.rating_matrix = Some(matrix);
            return run;
        };
        ctx.emit(DebateEvent::CouncilSynthesisStart {
            chairman: chairman.clone(),
            synthesizer: synthesizer.clone(),
        });

        let prompt = PromptTemplate::chairman_prompt(question.content(), context, &tasks, &matrix);
        let decision = synthesize(
            ctx,
            &synthesizer,
            PromptTemplate::chairman_system(),
            &prompt,
            |token| {
                ctx.emit(DebateEvent::CouncilSynthesisStreaming {
                    synthesizer: synthesizer.clone(),
                    token: token.to_string(),
                })
            },
        )
        .await;

        let mut run = CouncilRun {
            tasks,
            divergence: Some(divergence),
            rating_matrix: Some(matrix),
            chairman,
            synthesizer: Some(synthesizer.clone()),
            decision: None,
            result: Ok(()),
        };
        match decision {
            Ok(decision) => {
                ctx.emit(DebateEvent::CouncilFinalDecision {
                    synthesizer,
                    decision: decision.clone(),
                });
                run.decision = Some(decision);
            }
            Err(e) => run.result = Err(e.into()),
        }
        run
    }

    /// Every completed answer is reviewed by every other council member,
    /// concurrently. Returns `None` when cancelled.
    async fn peer_review(
        &self,
        ctx: &RunContext,
        question: &Question,
        context: &DebateContext,
        tasks: &[Task],
    ) -> Option<Vec<PeerReview>> {
        let providers = &self.config.council_providers;
        let jobs: Vec<ReviewJob> = tasks
            .iter()
            .enumerate()
            .filter_map(|(index, task)| {
                let target = task.identity.provider()?;
                let response = task.prompt_text()?;
                Some((index, target, response))
            })
            .flat_map(|(index, target, response)| {
                providers
                    .iter()
                    .filter(move |reviewer| *reviewer != target)
                    .map(move |reviewer| ReviewJob {
                        reviewer: reviewer.clone(),
                        target: target.clone(),
                        label: anonymous_label(index),
                        response: response.clone(),
                    })
            })
            .collect();

        info!(session = %ctx.session_id, reviews = jobs.len(), "council: peer review");
        ctx.emit(DebateEvent::CouncilPeerReviewStart {
            total_reviews: jobs.len(),
        });

        let mut join_set = JoinSet::new();
        for job in jobs {
            let ctx = ctx.clone();
            let question = question.content().to_string();
            let context = context.clone();
            join_set.spawn(async move {
                let result = review(&ctx, &question, &context, &job).await;
                (job, result)
            });
        }

        let mut reviews = Vec::new();
        loop {
            tokio::select! {
                biased;
                _ = ctx.cancellation.cancelled() => {
                    join_set.abort_all();
                    return None;
                }
                joined = join_set.join_next() => match joined {
                    Some(Ok((job, Ok(raw)))) => {
                        match parse_peer_review(&job.reviewer, &job.target, &raw) {
                            Some(review) => {
                                debug!(
                                    reviewer = %review.reviewer,
                                    target = %review.target,
                                    score = review.score,
                                    "peer review"
                                );
                                ctx.emit(DebateEvent::CouncilPeerReview {
                                    reviewer: review.reviewer.clone(),
                                    target: review.target.clone(),
                                    score: review.score,
                                });
                                reviews.push(review);
                            }
                            None => warn!(
                                reviewer = %job.reviewer,
                                target = %job.target,
                                "peer review had no readable score"
                            ),
                        }
                    }
                    Some(Ok((job, Err(GenerationError::Cancelled)))) => {
                        debug!(reviewer = %job.reviewer, "peer review cancelled");
                    }
                    Some(Ok((job, Err(e)))) => {
                        warn!(reviewer = %job.reviewer, target = %job.target, error = %e, "peer review failed");
                    }
                    Some(Err(e)) => warn!("review join error: {}", e),
                    None => break,
                },
            }
        }

        Some(reviews)
    }
}

async fn review(
    ctx: &RunContext,
    question: &str,
    context: &DebateContext,
    job: &ReviewJob,
) -> Result<String, GenerationError> {
    let options = SessionOptions::with_system_prompt(PromptTemplate::review_system());
    let session = open_session(
        ctx.gateway.as_ref(),
        &job.reviewer,
        &options,
        &ctx.cancellation,
    )
    .await?;
    let prompt = PromptTemplate::peer_review_prompt(question, context, &job.label, &job.response);
    send_with_cancellation(session.as_ref(), &prompt, &ctx.cancellation).await
}

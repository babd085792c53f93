//! Role and provider executors, and the parallel fan-out that runs them
//!
//! An executor binds one generation call to an identity: it owns the
//! [`Task`], drives it through its phases while emitting progress events, and
//! hands the terminal task back. [`fan_out`] launches a whole set of
//! executors in a `JoinSet` and waits for all of them (or for cancellation).

use super::generation::{GenerationError, generate};
use crate::ports::event_emitter::EventEmitter;
use crate::ports::llm_gateway::{LlmGateway, SessionOptions};
use debate_domain::{
    DebateContext, DebateEvent, Identity, InputSummary, PromptTemplate, Provider, Question, Role,
    SessionId, Task,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything an executor needs to run one identity's generation
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub identity: Identity,
    /// Backend serving the call
    pub provider: Provider,
    pub options: SessionOptions,
    pub prompt: String,
    pub input_summary: InputSummary,
}

fn input_summary(question: &Question, context: &DebateContext, concern: Option<&str>) -> InputSummary {
    InputSummary {
        query_preview: question.preview(),
        context_keys: context.keys().cloned().collect(),
        primary_concern: concern.map(str::to_string),
    }
}

impl TaskSpec {
    /// Executor spec for one executive seat, served by `provider`
    pub fn for_role(
        role: Role,
        provider: &Provider,
        question: &Question,
        context: &DebateContext,
    ) -> Self {
        Self {
            identity: Identity::Role(role),
            provider: provider.clone(),
            options: SessionOptions::with_system_prompt(PromptTemplate::executive_system(role))
                .temperature(role.temperature()),
            prompt: PromptTemplate::executive_prompt(question.content(), context),
            input_summary: input_summary(question, context, Some(role.primary_concern())),
        }
    }

    /// Executor spec for one council member's first-round answer
    pub fn for_provider(provider: &Provider, question: &Question, context: &DebateContext) -> Self {
        Self {
            identity: Identity::Provider(provider.clone()),
            provider: provider.clone(),
            options: SessionOptions::with_system_prompt(PromptTemplate::council_system()),
            prompt: PromptTemplate::divergence_prompt(question.content(), context),
            input_summary: input_summary(question, context, None),
        }
    }
}

/// Shared handles every executor in a debate uses
#[derive(Clone)]
pub struct RunContext {
    pub session_id: SessionId,
    pub gateway: Arc<dyn LlmGateway>,
    pub emitter: Arc<dyn EventEmitter>,
    pub cancellation: CancellationToken,
}

impl RunContext {
    pub fn emit(&self, event: DebateEvent) {
        self.emitter.emit(&self.session_id, event);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// Run one spec to a terminal task.
///
/// Decode failures still complete the task (with a raw fallback); only
/// transport failures and cancellation end in the error phase.
pub async fn execute(ctx: &RunContext, spec: TaskSpec) -> Task {
    let TaskSpec {
        identity,
        provider,
        options,
        prompt,
        input_summary,
    } = spec;

    let mut task = Task::pending(identity.clone());
    task.start();
    ctx.emit(DebateEvent::task_started(&identity, input_summary));
    debug!(identity = %identity, provider = %provider, "task started");

    let result = {
        let task = &mut task;
        generate(
            ctx.gateway.as_ref(),
            &provider,
            &options,
            &prompt,
            &ctx.cancellation,
            |token| {
                task.mark_streaming();
                ctx.emit(DebateEvent::task_token(&identity, token));
            },
        )
        .await
    };

    match result {
        Ok(raw) => {
            task.complete(raw);
            let parsed = task.parsed_output().and_then(|o| o.to_json());
            if parsed.is_none() {
                warn!(identity = %identity, "output did not decode; keeping raw text");
            }
            let raw = task.raw_output.clone().unwrap_or_default();
            ctx.emit(DebateEvent::task_complete(&identity, raw, parsed));
        }
        Err(GenerationError::Cancelled) => {
            task.cancel();
        }
        Err(e) => {
            warn!(identity = %identity, error = %e, "task failed");
            task.fail(e.to_string());
            ctx.emit(DebateEvent::task_error(&identity, e.to_string()));
        }
    }
    task
}

/// Result of a fan-out barrier
#[derive(Debug)]
pub enum FanOut {
    /// Every task reached a terminal phase on its own
    Completed(Vec<Task>),
    /// Cancellation arrived first; unfinished tasks were aborted and marked
    Cancelled(Vec<Task>),
}

impl FanOut {
    pub fn into_tasks(self) -> Vec<Task> {
        match self {
            FanOut::Completed(tasks) | FanOut::Cancelled(tasks) => tasks,
        }
    }
}

/// Launch every spec concurrently and wait until all are terminal.
///
/// Tasks come back in spec order. A failing task never cancels its siblings.
/// On cancellation the remaining executors are aborted, and every task that
/// had not finished is recorded as an error with detail "cancelled".
pub async fn fan_out(ctx: &RunContext, specs: Vec<TaskSpec>) -> FanOut {
    let identities: Vec<Identity> = specs.iter().map(|s| s.identity.clone()).collect();
    let mut slots: Vec<Option<Task>> = vec![None; specs.len()];
    let mut join_set = JoinSet::new();

    info!(session = %ctx.session_id, tasks = specs.len(), "fan-out");
    for (index, spec) in specs.into_iter().enumerate() {
        let ctx = ctx.clone();
        join_set.spawn(async move { (index, execute(&ctx, spec).await) });
    }

    let mut cancelled = false;
    loop {
        tokio::select! {
            biased;
            _ = ctx.cancellation.cancelled() => {
                join_set.abort_all();
                cancelled = true;
                break;
            }
            joined = join_set.join_next() => match joined {
                Some(Ok((index, task))) => slots[index] = Some(task),
                Some(Err(e)) => warn!("executor join error: {}", e),
                None => break,
            },
        }
    }

    // Executors that finished before the abort keep their results.
    if cancelled {
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, task)) => slots[index] = Some(task),
                Err(e) if e.is_cancelled() => {}
                Err(e) => warn!("executor join error: {}", e),
            }
        }
    }

    let tasks: Vec<Task> = slots
        .into_iter()
        .zip(identities)
        .map(|(slot, identity)| {
            slot.unwrap_or_else(|| {
                let mut task = Task::pending(identity);
                if cancelled {
                    task.cancel();
                } else {
                    task.fail("executor stopped unexpectedly");
                }
                task
            })
        })
        .collect();

    if cancelled {
        info!(session = %ctx.session_id, "fan-out cancelled");
        FanOut::Cancelled(tasks)
    } else {
        FanOut::Completed(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{CancellingEmitter, MockGateway, RecordingEmitter, Reply};
    use debate_domain::TaskPhase;

    fn ctx(gateway: MockGateway, emitter: Arc<RecordingEmitter>) -> RunContext {
        RunContext {
            session_id: SessionId::from("test"),
            gateway: Arc::new(gateway),
            emitter,
            cancellation: CancellationToken::new(),
        }
    }

    fn question() -> Question {
        Question::try_new("Launch a usage-based pricing tier?").unwrap()
    }

    #[tokio::test]
    async fn test_role_executor_emits_lifecycle() {
        let gateway = MockGateway::new().reply(
            Provider::Azure,
            Reply::stream(&["{\"financial_recommendation\": ", "\"proceed\"}"]),
        );
        let emitter = Arc::new(RecordingEmitter::default());
        let ctx = ctx(gateway, emitter.clone());
        let spec = TaskSpec::for_role(Role::Cfo, &Provider::Azure, &question(), &DebateContext::new());

        let task = execute(&ctx, spec).await;

        assert_eq!(task.phase, TaskPhase::Complete);
        assert_eq!(task.recommendation(), Some("proceed"));
        assert_eq!(
            emitter.names(),
            vec!["exec_started", "exec_streaming", "exec_streaming", "exec_complete"]
        );
    }

    #[tokio::test]
    async fn test_unparseable_output_completes() {
        let gateway = MockGateway::new().reply(Provider::Google, Reply::text("I like it."));
        let emitter = Arc::new(RecordingEmitter::default());
        let ctx = ctx(gateway, emitter.clone());
        let spec = TaskSpec::for_provider(&Provider::Google, &question(), &DebateContext::new());

        let task = execute(&ctx, spec).await;

        assert_eq!(task.phase, TaskPhase::Complete);
        assert!(task.parsed_output().is_none());
        assert_eq!(task.raw_output.as_deref(), Some("I like it."));
    }

    #[tokio::test]
    async fn test_network_failure_is_an_error_without_raw_output() {
        let gateway = MockGateway::new().reply(Provider::Azure, Reply::fail("connection refused"));
        let emitter = Arc::new(RecordingEmitter::default());
        let ctx = ctx(gateway, emitter.clone());
        let spec = TaskSpec::for_role(Role::Cto, &Provider::Azure, &question(), &DebateContext::new());

        let task = execute(&ctx, spec).await;

        assert_eq!(task.phase, TaskPhase::Error);
        assert!(task.raw_output.is_none());
        assert_eq!(emitter.names(), vec!["exec_started", "exec_error"]);
    }

    #[tokio::test]
    async fn test_fan_out_isolates_failures_and_keeps_order() {
        let gateway = MockGateway::new()
            .reply(Provider::Azure, Reply::text(r#"{"recommendation": "GO"}"#))
            .reply(Provider::Anthropic, Reply::fail("rate limited"))
            .reply(Provider::Google, Reply::text(r#"{"recommendation": "HOLD"}"#));
        let ctx = ctx(gateway, Arc::new(RecordingEmitter::default()));
        let specs = Provider::default_providers()
            .iter()
            .map(|p| TaskSpec::for_provider(p, &question(), &DebateContext::new()))
            .collect();

        let FanOut::Completed(tasks) = fan_out(&ctx, specs).await else {
            panic!("fan-out should complete");
        };

        let keys: Vec<&str> = tasks.iter().map(|t| t.identity.key()).collect();
        assert_eq!(keys, vec!["azure", "anthropic", "google"]);
        assert_eq!(tasks[0].phase, TaskPhase::Complete);
        assert_eq!(tasks[1].phase, TaskPhase::Error);
        assert_eq!(tasks[2].recommendation(), Some("HOLD"));
    }

    #[tokio::test]
    async fn test_fan_out_cancellation_marks_everything_terminal() {
        let gateway = MockGateway::new()
            .reply(Provider::Azure, Reply::text(r#"{"recommendation": "GO"}"#))
            .reply(Provider::Anthropic, Reply::hang())
            .reply(Provider::Google, Reply::hang());
        let emitter = Arc::new(RecordingEmitter::default());
        let ctx = ctx(gateway, emitter.clone());
        let specs = Provider::default_providers()
            .iter()
            .map(|p| TaskSpec::for_provider(p, &question(), &DebateContext::new()))
            .collect();

        let cancel = ctx.cancellation.clone();
        let waiter = emitter.clone();
        tokio::spawn(async move {
            waiter.wait_for("council_response_complete").await;
            cancel.cancel();
        });

        let FanOut::Cancelled(tasks) = fan_out(&ctx, specs).await else {
            panic!("fan-out should be cancelled");
        };

        assert!(tasks.iter().all(Task::is_terminal));
        assert_eq!(tasks[0].phase, TaskPhase::Complete);
        for task in &tasks[1..] {
            assert_eq!(task.phase, TaskPhase::Error);
            assert_eq!(task.error.as_deref(), Some("cancelled"));
        }
    }

    #[tokio::test]
    async fn test_fan_out_keeps_tasks_finished_when_cancel_lands() {
        let gateway = MockGateway::new()
            .reply(Provider::Azure, Reply::text(r#"{"recommendation": "GO"}"#))
            .reply(Provider::Anthropic, Reply::hang())
            .reply(Provider::Google, Reply::hang());
        let cancellation = CancellationToken::new();
        // the token flips while azure's executor is still emitting its completion
        let emitter = Arc::new(CancellingEmitter::new(
            "council_response_complete",
            cancellation.clone(),
        ));
        let ctx = RunContext {
            session_id: SessionId::from("test"),
            gateway: Arc::new(gateway),
            emitter: emitter.clone(),
            cancellation,
        };
        let specs = Provider::default_providers()
            .iter()
            .map(|p| TaskSpec::for_provider(p, &question(), &DebateContext::new()))
            .collect();

        let FanOut::Cancelled(tasks) = fan_out(&ctx, specs).await else {
            panic!("fan-out should be cancelled");
        };

        assert_eq!(emitter.recorder.count("council_response_complete"), 1);
        assert_eq!(tasks[0].phase, TaskPhase::Complete);
        assert!(tasks[0].error.is_none());
        assert_eq!(tasks[0].recommendation(), Some("GO"));
        for task in &tasks[1..] {
            assert_eq!(task.error.as_deref(), Some("cancelled"));
        }
    }
}

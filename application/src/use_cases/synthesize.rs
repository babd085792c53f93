//! Decision synthesizer: one generation call turned into a [`FinalDecision`]

use super::executor::RunContext;
use super::generation::{GenerationError, generate};
use crate::ports::llm_gateway::{GatewayError, SessionOptions};
use debate_domain::{DomainError, FinalDecision, Provider, parse_final_decision};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    #[error("synthesis cancelled")]
    Cancelled,

    #[error("synthesis call failed: {0}")]
    Generation(GatewayError),

    #[error("synthesis output rejected: {0}")]
    Malformed(#[from] DomainError),
}

impl From<GenerationError> for SynthesisError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::Cancelled => SynthesisError::Cancelled,
            GenerationError::Gateway(e) => SynthesisError::Generation(e),
        }
    }
}

/// Run the synthesis prompt on `provider` and parse the answer.
///
/// There is no fallback: an answer that does not parse is an error.
pub async fn synthesize<F>(
    ctx: &RunContext,
    provider: &Provider,
    system_prompt: &str,
    prompt: &str,
    on_token: F,
) -> Result<FinalDecision, SynthesisError>
where
    F: FnMut(&str),
{
    info!(session = %ctx.session_id, provider = %provider, "synthesizing decision");
    let options = SessionOptions::with_system_prompt(system_prompt);
    let raw = generate(
        ctx.gateway.as_ref(),
        provider,
        &options,
        prompt,
        &ctx.cancellation,
        on_token,
    )
    .await?;

    parse_final_decision(&raw).map_err(|e| {
        warn!(session = %ctx.session_id, error = %e, "synthesis output did not parse");
        SynthesisError::Malformed(e)
    })
}

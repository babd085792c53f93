//! Generation task: one cancellable, streamed call to a backend
//!
//! Every await point races the session's cancellation token with
//! `tokio::select!` (biased toward cancellation), so dropping out of a debate
//! also drops the in-flight request future.

use crate::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession, SessionOptions};
use debate_domain::{Provider, StreamEvent};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("cancelled")]
    Cancelled,
}

impl GenerationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GenerationError::Cancelled)
    }
}

/// Open a session, racing the cancellation token.
pub async fn open_session(
    gateway: &dyn LlmGateway,
    provider: &Provider,
    options: &SessionOptions,
    cancellation: &CancellationToken,
) -> Result<Box<dyn LlmSession>, GenerationError> {
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => Err(GenerationError::Cancelled),
        session = gateway.create_session(provider, options) => Ok(session?),
    }
}

/// Stream a completion, calling `on_token` for each delta in order.
///
/// Returns the full text on success. Transport errors, a stream that closes
/// without completing, and cancellation all surface as a single error.
pub async fn stream_with_cancellation<F>(
    session: &dyn LlmSession,
    prompt: &str,
    cancellation: &CancellationToken,
    mut on_token: F,
) -> Result<String, GenerationError>
where
    F: FnMut(&str),
{
    let handle = tokio::select! {
        biased;
        _ = cancellation.cancelled() => return Err(GenerationError::Cancelled),
        handle = session.send_streaming(prompt) => handle?,
    };
    let mut receiver = handle.receiver;
    let mut full_text = String::new();

    loop {
        let event = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(GenerationError::Cancelled),
            event = receiver.recv() => event,
        };

        match event {
            Some(StreamEvent::Delta(chunk)) => {
                if chunk.is_empty() {
                    continue;
                }
                on_token(&chunk);
                full_text.push_str(&chunk);
            }
            Some(StreamEvent::Completed(text)) => {
                if full_text.is_empty() {
                    full_text = text;
                }
                debug!(
                    provider = %session.provider(),
                    chars = full_text.len(),
                    "generation complete"
                );
                return Ok(full_text);
            }
            Some(StreamEvent::Error(e)) => {
                return Err(GatewayError::RequestFailed(e).into());
            }
            None => {
                return Err(GatewayError::MalformedResponse(
                    "stream closed before completion".to_string(),
                )
                .into());
            }
        }
    }
}

/// Non-streaming send, racing the cancellation token.
pub async fn send_with_cancellation(
    session: &dyn LlmSession,
    prompt: &str,
    cancellation: &CancellationToken,
) -> Result<String, GenerationError> {
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => Err(GenerationError::Cancelled),
        text = session.send(prompt) => Ok(text?),
    }
}

/// Open a session and stream one prompt through it.
pub async fn generate<F>(
    gateway: &dyn LlmGateway,
    provider: &Provider,
    options: &SessionOptions,
    prompt: &str,
    cancellation: &CancellationToken,
    on_token: F,
) -> Result<String, GenerationError>
where
    F: FnMut(&str),
{
    let session = open_session(gateway, provider, options, cancellation).await?;
    stream_with_cancellation(session.as_ref(), prompt, cancellation, on_token).await
}

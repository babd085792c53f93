//! Shared HTTP session used by every provider adapter
//!
//! Each backend only describes its wire format through a [`Dialect`]; request
//! sending, status classification and SSE streaming live here.

use super::ProviderAdapter;
use super::error::{network_error, status_error};
use super::sse::{SseEvent, SseParser};
use async_trait::async_trait;
use debate_application::{GatewayError, LlmSession, SessionOptions, StreamHandle};
use debate_domain::{Provider, StreamEvent};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const STREAM_BUFFER: usize = 64;

/// What one SSE event means for the text being generated
#[derive(Debug, Clone, PartialEq)]
pub enum StreamStep {
    /// More text
    Delta(String),
    /// Nothing to forward (pings, metadata)
    Skip,
    /// The backend signalled the end of the answer
    Done,
    /// The backend reported an error inside the stream
    Failed(String),
}

/// Wire format of one backend
pub trait Dialect: Send + Sync + 'static {
    /// Build the HTTP request for one prompt
    fn request(
        &self,
        client: &Client,
        options: &SessionOptions,
        prompt: &str,
        stream: bool,
    ) -> RequestBuilder;

    /// Text of a complete (non-streamed) response body
    fn response_text(&self, body: &Value) -> Option<String>;

    /// Interpret one event of a streamed response
    fn stream_step(&self, event: &SseEvent) -> StreamStep;
}

/// Parse an SSE `data:` payload as JSON, mapping garbage to a stream failure.
pub(crate) fn event_json(event: &SseEvent) -> Result<Value, StreamStep> {
    serde_json::from_str(&event.data)
        .map_err(|e| StreamStep::Failed(format!("unreadable stream event: {e}")))
}

/// Adapter serving one provider through a [`Dialect`]
pub struct HttpAdapter<D: Dialect> {
    provider: Provider,
    client: Client,
    dialect: Arc<D>,
}

impl<D: Dialect> HttpAdapter<D> {
    pub fn new(provider: Provider, client: Client, dialect: D) -> Self {
        Self {
            provider,
            client,
            dialect: Arc::new(dialect),
        }
    }
}

#[async_trait]
impl<D: Dialect> ProviderAdapter for HttpAdapter<D> {
    fn provider(&self) -> &Provider {
        &self.provider
    }

    async fn create_session(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(Box::new(HttpSession {
            provider: self.provider.clone(),
            client: self.client.clone(),
            dialect: Arc::clone(&self.dialect),
            options: options.clone(),
        }))
    }
}

/// One conversation with a backend; every prompt is a fresh single-turn request
pub struct HttpSession<D: Dialect> {
    provider: Provider,
    client: Client,
    dialect: Arc<D>,
    options: SessionOptions,
}

impl<D: Dialect> HttpSession<D> {
    async fn post(&self, prompt: &str, stream: bool) -> Result<Response, GatewayError> {
        let response = self
            .dialect
            .request(&self.client, &self.options, prompt, stream)
            .send()
            .await
            .map_err(|e| network_error(&self.provider, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(provider = %self.provider, status = %status, "provider returned an error");
            return Err(status_error(&self.provider, status, &body));
        }
        Ok(response)
    }
}

#[async_trait]
impl<D: Dialect> LlmSession for HttpSession<D> {
    fn provider(&self) -> &Provider {
        &self.provider
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        let response = self.post(content, false).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(format!("{}: {e}", self.provider)))?;
        self.dialect.response_text(&body).ok_or_else(|| {
            GatewayError::MalformedResponse(format!("{}: response carried no text", self.provider))
        })
    }

    async fn send_streaming(&self, content: &str) -> Result<StreamHandle, GatewayError> {
        let response = self.post(content, true).await?;
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let dialect = Arc::clone(&self.dialect);
        let provider = self.provider.clone();

        tokio::spawn(async move {
            pump(provider, dialect, response, tx).await;
        });

        Ok(StreamHandle::new(rx))
    }
}

/// Forward a streamed body into the channel until it ends or the receiver goes away.
async fn pump<D: Dialect>(
    provider: Provider,
    dialect: Arc<D>,
    mut response: Response,
    tx: mpsc::Sender<StreamEvent>,
) {
    let mut parser = SseParser::new();
    let mut full = String::new();

    loop {
        let chunk = tokio::select! {
            // receiver dropped: stop reading so the connection closes
            _ = tx.closed() => {
                debug!(provider = %provider, "stream receiver closed");
                return;
            }
            chunk = response.chunk() => chunk,
        };

        let events = match chunk {
            Ok(Some(bytes)) => parser.push(&bytes),
            Ok(None) => {
                let tail = parser.finish();
                if let Some(event) = tail
                    && let StreamStep::Delta(text) = dialect.stream_step(&event)
                {
                    full.push_str(&text);
                    let _ = tx.send(StreamEvent::Delta(text)).await;
                }
                break;
            }
            Err(e) => {
                let _ = tx
                    .send(StreamEvent::Error(network_error(&provider, &e).to_string()))
                    .await;
                return;
            }
        };

        for event in events {
            match dialect.stream_step(&event) {
                StreamStep::Delta(text) => {
                    full.push_str(&text);
                    if tx.send(StreamEvent::Delta(text)).await.is_err() {
                        return;
                    }
                }
                StreamStep::Skip => {}
                StreamStep::Done => {
                    let _ = tx.send(StreamEvent::Completed(full)).await;
                    return;
                }
                StreamStep::Failed(message) => {
                    warn!(provider = %provider, "stream error: {}", message);
                    let _ = tx.send(StreamEvent::Error(message)).await;
                    return;
                }
            }
        }
    }

    let _ = tx.send(StreamEvent::Completed(full)).await;
}

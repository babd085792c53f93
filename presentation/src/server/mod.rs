//! Websocket and HTTP server
//!
//! Clients open `/ws`, send `start_debate` and receive the session's progress
//! events as JSON text frames. Finished debates are browsable over plain HTTP.

pub mod connection;
pub mod hub;
pub mod protocol;
pub mod routes;

pub use connection::Connection;
pub use hub::SessionHub;
pub use protocol::ClientMessage;

use axum::Router;
use axum::routing::get;
use debate_application::{DebateRepository, LlmGateway, RunDebateUseCase, SessionRegistry};
use debate_domain::Provider;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Shared state of every handler
pub struct ServerState<G: LlmGateway + 'static> {
    pub use_case: Arc<RunDebateUseCase<G>>,
    pub hub: Arc<SessionHub>,
    pub registry: Arc<SessionRegistry>,
    pub repository: Arc<dyn DebateRepository>,
    /// Providers the gateway can reach
    pub providers: Arc<Vec<Provider>>,
    pub started_at: Instant,
}

// manual impl: derive would demand `G: Clone`
impl<G: LlmGateway + 'static> Clone for ServerState<G> {
    fn clone(&self) -> Self {
        Self {
            use_case: Arc::clone(&self.use_case),
            hub: Arc::clone(&self.hub),
            registry: Arc::clone(&self.registry),
            repository: Arc::clone(&self.repository),
            providers: Arc::clone(&self.providers),
            started_at: self.started_at,
        }
    }
}

impl<G: LlmGateway + 'static> ServerState<G> {
    /// `use_case` must emit through `hub` for clients to see any progress.
    pub fn new(
        use_case: Arc<RunDebateUseCase<G>>,
        hub: Arc<SessionHub>,
        repository: Arc<dyn DebateRepository>,
        providers: Vec<Provider>,
    ) -> Self {
        Self {
            use_case,
            hub,
            registry: Arc::new(SessionRegistry::new()),
            repository,
            providers: Arc::new(providers),
            started_at: Instant::now(),
        }
    }
}

pub fn build_router<G: LlmGateway + 'static>(state: ServerState<G>) -> Router {
    let api = Router::new()
        .route("/api/debates", get(routes::api_debates::<G>))
        .route("/api/debates/:id", get(routes::api_debate::<G>))
        .route("/api/providers", get(routes::api_providers::<G>))
        .route("/api/estimate/:method", get(routes::api_estimate::<G>));

    Router::new()
        .route("/health", get(routes::health_handler::<G>))
        .route("/ws", get(connection::ws_handler::<G>))
        .merge(api)
        .with_state(state)
}

/// Serve until `shutdown` fires, then cancel every running debate.
pub async fn serve<G: LlmGateway + 'static>(
    state: ServerState<G>,
    bind_addr: &str,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let registry = Arc::clone(&state.registry);
    let use_case = Arc::clone(&state.use_case);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Debate console listening on ws://{}/ws", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    registry.shutdown();
    use_case.flush().await;
    info!("Server stopped");
    Ok(())
}

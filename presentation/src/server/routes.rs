//! Plain HTTP endpoints: health, history and estimates

use super::ServerState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use debate_application::{LlmGateway, RepositoryError};
use debate_domain::{CostEstimate, DebateMethod, DebateSession, DebateSummary, SessionId};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Debate {0} not found")]
    NotFound(SessionId),

    #[error("{0}")]
    BadRequest(String),

    #[error("History unavailable: {0}")]
    Repository(#[from] RepositoryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Repository(e) => {
                warn!("history request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub async fn health_handler<G: LlmGateway + 'static>(
    State(state): State<ServerState<G>>,
) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "providers": state.providers.len(),
        "active_debates": state.registry.active_ids().len(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn api_debates<G: LlmGateway + 'static>(
    State(state): State<ServerState<G>>,
) -> Result<Json<Vec<DebateSummary>>, ApiError> {
    Ok(Json(state.repository.list().await?))
}

pub async fn api_debate<G: LlmGateway + 'static>(
    State(state): State<ServerState<G>>,
    Path(id): Path<String>,
) -> Result<Json<DebateSession>, ApiError> {
    let id = SessionId::from(id);
    match state.repository.get(&id).await? {
        Some(session) => Ok(Json(session)),
        None => Err(ApiError::NotFound(id)),
    }
}

/// One reachable provider and where it takes part
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderInfo {
    pub provider: String,
    pub name: String,
    pub cost_per_1k_tokens: f64,
    pub consensus: bool,
    pub council: bool,
    pub chairman: bool,
}

pub async fn api_providers<G: LlmGateway + 'static>(
    State(state): State<ServerState<G>>,
) -> Json<Value> {
    let config = state.use_case.config();
    let providers: Vec<ProviderInfo> = state
        .providers
        .iter()
        .map(|p| ProviderInfo {
            provider: p.as_str().to_string(),
            name: p.display_name().to_string(),
            cost_per_1k_tokens: p.cost_per_1k_tokens(),
            consensus: &config.consensus_provider == p,
            council: config.council_providers.contains(p),
            chairman: config.chairman_provider.as_ref() == Some(p),
        })
        .collect();
    let estimates: Vec<CostEstimate> = [
        DebateMethod::Consensus,
        DebateMethod::Council,
        DebateMethod::Both,
    ]
    .into_iter()
    .map(|m| state.use_case.estimate(m))
    .collect();

    Json(json!({ "providers": providers, "estimates": estimates }))
}

pub async fn api_estimate<G: LlmGateway + 'static>(
    State(state): State<ServerState<G>>,
    Path(method): Path<String>,
) -> Result<Json<CostEstimate>, ApiError> {
    let method: DebateMethod = method
        .parse()
        .map_err(|e: debate_domain::DomainError| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(state.use_case.estimate(method)))
}

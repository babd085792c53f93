//! Provider construction errors and HTTP failure classification

use debate_application::GatewayError;
use debate_domain::Provider;
use debate_domain::util::truncate_str;
use reqwest::StatusCode;
use thiserror::Error;

const MAX_ERROR_BODY: usize = 300;

/// Why a provider adapter could not be built
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider}: no API key (set {env} or providers.{provider}.api_key)")]
    MissingApiKey { provider: Provider, env: String },

    #[error("{provider}: no endpoint configured (providers.{provider}.base_url)")]
    MissingEndpoint { provider: Provider },

    #[error("{provider}: no model configured (providers.{provider}.model)")]
    MissingModel { provider: Provider },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Classify a non-success HTTP status into a gateway error.
pub(crate) fn status_error(provider: &Provider, status: StatusCode, body: &str) -> GatewayError {
    let body = truncate_str(body.trim(), MAX_ERROR_BODY);
    match status.as_u16() {
        401 | 403 => {
            GatewayError::ProviderNotAvailable(format!("{provider}: authentication failed ({status})"))
        }
        404 => GatewayError::ProviderNotAvailable(format!("{provider}: model not found: {body}")),
        408 | 504 => GatewayError::Timeout,
        429 => GatewayError::RequestFailed(format!("{provider}: rate limited: {body}")),
        _ => GatewayError::RequestFailed(format!("{provider}: HTTP {status}: {body}")),
    }
}

/// Classify a transport-level reqwest failure.
pub(crate) fn network_error(provider: &Provider, err: &reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else if err.is_connect() {
        GatewayError::ConnectionError(format!("{provider}: {err}"))
    } else {
        GatewayError::RequestFailed(format!("{provider}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let p = Provider::Anthropic;
        assert!(matches!(
            status_error(&p, StatusCode::UNAUTHORIZED, ""),
            GatewayError::ProviderNotAvailable(_)
        ));
        assert_eq!(
            status_error(&p, StatusCode::GATEWAY_TIMEOUT, ""),
            GatewayError::Timeout
        );
        let GatewayError::RequestFailed(msg) =
            status_error(&p, StatusCode::TOO_MANY_REQUESTS, "slow down")
        else {
            panic!("expected RequestFailed");
        };
        assert!(msg.contains("rate limited"));
        assert!(msg.contains("slow down"));
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        let GatewayError::RequestFailed(msg) =
            status_error(&Provider::Google, StatusCode::INTERNAL_SERVER_ERROR, &body)
        else {
            panic!("expected RequestFailed");
        };
        assert!(msg.len() < 400);
    }
}

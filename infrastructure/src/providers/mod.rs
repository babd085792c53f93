//! Provider adapters: HTTP clients for each generation backend
//!
//! - [`anthropic`]: Messages API
//! - [`openai`]: Chat Completions (OpenAI, Azure OpenAI, compatible backends)
//! - [`gemini`]: Gemini `generateContent`
//! - [`routing::RoutingGateway`]: the [`LlmGateway`](debate_application::LlmGateway)
//!   that dispatches each session to its provider's adapter

pub mod anthropic;
pub mod error;
pub mod gemini;
pub mod http;
pub mod openai;
pub mod routing;
pub mod sse;

use crate::config::ProviderSettings;
use anthropic::AnthropicDialect;
use async_trait::async_trait;
use debate_application::{GatewayError, LlmSession, SessionOptions};
use debate_domain::Provider;
use error::ProviderError;
use gemini::GeminiDialect;
use http::HttpAdapter;
use openai::{OpenAiDialect, OpenAiEndpoint};
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> &Provider;
    async fn create_session(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn LlmSession>, GatewayError>;
}

/// Build the adapter for `provider` from its resolved settings.
///
/// Fails when the provider has no usable credentials or endpoint.
pub fn build_adapter(
    provider: &Provider,
    settings: &ProviderSettings,
) -> Result<Arc<dyn ProviderAdapter>, ProviderError> {
    let api_key = settings.api_key().ok_or_else(|| ProviderError::MissingApiKey {
        provider: provider.clone(),
        env: settings.api_key_env.clone(),
    })?;
    if settings.model.is_empty() {
        return Err(ProviderError::MissingModel {
            provider: provider.clone(),
        });
    }
    let base_url = match (provider, &settings.base_url) {
        (_, Some(url)) => url.clone(),
        (Provider::Azure, None) => std::env::var("AZURE_OPENAI_ENDPOINT")
            .ok()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ProviderError::MissingEndpoint {
                provider: provider.clone(),
            })?,
        (_, None) => {
            return Err(ProviderError::MissingEndpoint {
                provider: provider.clone(),
            });
        }
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?;
    let model = settings.model.clone();
    let max_tokens = settings.max_tokens;
    let provider = provider.clone();

    let adapter: Arc<dyn ProviderAdapter> = match &provider {
        Provider::Anthropic => Arc::new(HttpAdapter::new(
            provider.clone(),
            client,
            AnthropicDialect {
                base_url,
                api_key,
                api_version: settings
                    .api_version
                    .clone()
                    .unwrap_or_else(|| "2023-06-01".to_string()),
                model,
                max_tokens,
            },
        )),
        Provider::Google => Arc::new(HttpAdapter::new(
            provider.clone(),
            client,
            GeminiDialect {
                base_url,
                api_key,
                model,
                max_tokens,
            },
        )),
        Provider::Azure => Arc::new(HttpAdapter::new(
            provider.clone(),
            client,
            OpenAiDialect {
                endpoint: OpenAiEndpoint::Azure {
                    endpoint: base_url,
                    api_version: settings
                        .api_version
                        .clone()
                        .unwrap_or_else(|| "2024-12-01-preview".to_string()),
                },
                api_key,
                model,
                max_tokens,
            },
        )),
        Provider::OpenAi | Provider::Custom(_) => Arc::new(HttpAdapter::new(
            provider.clone(),
            client,
            OpenAiDialect {
                endpoint: OpenAiEndpoint::OpenAi { base_url },
                api_key,
                model,
                max_tokens,
            },
        )),
    };
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileProviderConfig;

    fn settings(raw: FileProviderConfig, provider: &Provider) -> ProviderSettings {
        raw.resolve(provider)
    }

    #[test]
    fn test_missing_key_is_reported_with_env_name() {
        let raw = FileProviderConfig {
            api_key_env: Some("DEBATE_TEST_UNSET_KEY_VARIABLE".into()),
            ..Default::default()
        };
        let err = build_adapter(&Provider::Google, &settings(raw, &Provider::Google))
            .err()
            .unwrap();
        assert!(err.to_string().contains("DEBATE_TEST_UNSET_KEY_VARIABLE"));
    }

    #[test]
    fn test_custom_provider_needs_endpoint() {
        let custom = Provider::Custom("local".into());
        let raw = FileProviderConfig {
            api_key: Some("none".into()),
            model: Some("llama3".into()),
            ..Default::default()
        };
        assert!(matches!(
            build_adapter(&custom, &settings(raw, &custom)),
            Err(ProviderError::MissingEndpoint { .. })
        ));
    }

    #[test]
    fn test_builds_configured_adapter() {
        let raw = FileProviderConfig {
            api_key: Some("sk-test".into()),
            ..Default::default()
        };
        let adapter =
            build_adapter(&Provider::Anthropic, &settings(raw, &Provider::Anthropic)).unwrap();
        assert_eq!(adapter.provider(), &Provider::Anthropic);
    }
}

use super::{ProviderAdapter, build_adapter};
use crate::config::FileProvidersConfig;
use async_trait::async_trait;
use debate_application::{GatewayError, LlmGateway, LlmSession, SessionOptions};
use debate_domain::Provider;
use std::sync::Arc;
use tracing::{info, warn};

/// Gateway that hands each session to the adapter of the requested provider
pub struct RoutingGateway {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl RoutingGateway {
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self { adapters }
    }

    /// Build adapters for `wanted` providers, skipping (with a warning) any
    /// that lack credentials or an endpoint.
    pub fn from_config(config: &FileProvidersConfig, wanted: &[Provider]) -> Self {
        let mut adapters: Vec<Arc<dyn ProviderAdapter>> = Vec::new();
        for provider in wanted {
            if adapters.iter().any(|a| a.provider() == provider) {
                continue;
            }
            let Some(settings) = config.settings(provider) else {
                warn!(provider = %provider, "not configured: no [providers.custom] section");
                continue;
            };
            match build_adapter(provider, &settings) {
                Ok(adapter) => {
                    info!(provider = %provider, model = %settings.model, "provider configured");
                    adapters.push(adapter);
                }
                Err(e) => warn!(provider = %provider, "not configured: {}", e),
            }
        }
        Self::new(adapters)
    }

    fn resolve(&self, provider: &Provider) -> Result<&dyn ProviderAdapter, GatewayError> {
        self.adapters
            .iter()
            .find(|a| a.provider() == provider)
            .map(|a| a.as_ref())
            .ok_or_else(|| GatewayError::ProviderNotAvailable(provider.to_string()))
    }
}

#[async_trait]
impl LlmGateway for RoutingGateway {
    async fn create_session(
        &self,
        provider: &Provider,
        options: &SessionOptions,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        self.resolve(provider)?.create_session(options).await
    }

    fn available_providers(&self) -> Vec<Provider> {
        self.adapters.iter().map(|a| a.provider().clone()).collect()
    }
}

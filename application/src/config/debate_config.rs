//! Debate configuration consumed by the use cases.
//!
//! Built by the binary from the merged file config; the use cases never read
//! files or environment variables themselves.

use debate_domain::Provider;
use debate_domain::debate::consensus::DEFAULT_SYNTHESIS_THRESHOLD;

/// Minimum council size accepted by default
pub const DEFAULT_MIN_COUNCIL_PROVIDERS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct DebateConfig {
    /// Provider running all four executives and the consensus synthesis
    pub consensus_provider: Provider,
    /// Council members, in identity order (ties in peer review go to the earlier one)
    pub council_providers: Vec<Provider>,
    /// Preferred chairman; used only when it is a council member
    pub chairman_provider: Option<Provider>,
    pub min_council_providers: usize,
    pub synthesis_threshold: f64,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            consensus_provider: Provider::default(),
            council_providers: Provider::default_providers(),
            chairman_provider: Some(Provider::Anthropic),
            min_council_providers: DEFAULT_MIN_COUNCIL_PROVIDERS,
            synthesis_threshold: DEFAULT_SYNTHESIS_THRESHOLD,
        }
    }
}

impl DebateConfig {
    pub fn with_council(mut self, providers: Vec<Provider>) -> Self {
        self.council_providers = providers;
        self
    }

    pub fn with_chairman(mut self, chairman: Option<Provider>) -> Self {
        self.chairman_provider = chairman;
        self
    }

    /// Keep only council members the gateway can reach, preserving order.
    pub fn restrict_council_to(&mut self, available: &[Provider]) {
        self.council_providers.retain(|p| available.contains(p));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DebateConfig::default();
        assert_eq!(config.consensus_provider, Provider::Azure);
        assert_eq!(config.council_providers.len(), 3);
        assert_eq!(config.min_council_providers, 2);
        assert_eq!(config.synthesis_threshold, 0.6);
    }

    #[test]
    fn test_restrict_council() {
        let mut config = DebateConfig::default();
        config.restrict_council_to(&[Provider::Google, Provider::Azure]);
        assert_eq!(config.council_providers, vec![Provider::Azure, Provider::Google]);
    }
}

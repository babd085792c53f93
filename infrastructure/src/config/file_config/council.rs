//! Council configuration from TOML (`[council]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [council]
//! providers = ["azure", "anthropic", "google"]
//! chairman_provider = "anthropic"
//! min_providers = 2
//! ```

use debate_application::config::debate_config::DEFAULT_MIN_COUNCIL_PROVIDERS;
use debate_domain::Provider;
use serde::{Deserialize, Serialize};

/// Raw council configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    /// Providers asked in the first round, in review order
    pub providers: Vec<Provider>,
    /// Provider that writes the final synthesis when it is enabled
    pub chairman_provider: Option<Provider>,
    /// Minimum number of enabled providers for a council run
    pub min_providers: usize,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        Self {
            providers: Provider::default_providers(),
            chairman_provider: Some(Provider::Anthropic),
            min_providers: DEFAULT_MIN_COUNCIL_PROVIDERS,
        }
    }
}

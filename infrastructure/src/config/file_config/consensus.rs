//! Consensus configuration from TOML (`[consensus]` section)

use debate_domain::Provider;
use debate_domain::debate::consensus::DEFAULT_SYNTHESIS_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Raw consensus configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConsensusConfig {
    /// Provider serving all four executives and the synthesis
    pub provider: Provider,
    /// Agreement level above which the debate goes straight to synthesis
    pub synthesis_threshold: f64,
}

impl Default for FileConsensusConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Azure,
            synthesis_threshold: DEFAULT_SYNTHESIS_THRESHOLD,
        }
    }
}

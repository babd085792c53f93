//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod consensus;
mod council;
mod history;
mod providers;
mod server;

pub use consensus::FileConsensusConfig;
pub use council::FileCouncilConfig;
pub use history::FileHistoryConfig;
pub use providers::{FileProviderConfig, FileProvidersConfig, ProviderSettings};
pub use server::FileServerConfig;

use debate_application::DebateConfig;
use debate_domain::Provider;
use serde::{Deserialize, Serialize};

/// How serious a configuration issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The configuration cannot work at all.
    Error,
    /// The configuration works but may not behave as expected.
    Warning,
}

/// A detected issue in the loaded configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub message: String,
}

impl ConfigIssue {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Council method settings
    pub council: FileCouncilConfig,
    /// Consensus method settings
    pub consensus: FileConsensusConfig,
    /// Per-provider connection settings
    pub providers: FileProvidersConfig,
    /// Websocket server settings
    pub server: FileServerConfig,
    /// Snapshot history settings
    pub history: FileHistoryConfig,
}

impl FileConfig {
    /// Application-level debate settings
    pub fn debate_config(&self) -> DebateConfig {
        DebateConfig {
            consensus_provider: self.consensus.provider.clone(),
            council_providers: self.council.providers.clone(),
            chairman_provider: self.council.chairman_provider.clone(),
            min_council_providers: self.council.min_providers,
            synthesis_threshold: self.consensus.synthesis_threshold,
        }
    }

    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let known = self.providers.known_providers();
        let is_unknown = |p: &Provider| matches!(p, Provider::Custom(_)) && !known.contains(p);

        for provider in self.council.providers.iter().filter(|p| is_unknown(p)) {
            issues.push(ConfigIssue::warning(format!(
                "council.providers: unknown provider '{provider}' (declare it under [providers.custom.{provider}])"
            )));
        }
        if is_unknown(&self.consensus.provider) {
            issues.push(ConfigIssue::error(format!(
                "consensus.provider: unknown provider '{}'",
                self.consensus.provider
            )));
        }

        if let Some(chairman) = &self.council.chairman_provider
            && !self.council.providers.contains(chairman)
        {
            issues.push(ConfigIssue::warning(format!(
                "council.chairman_provider: '{chairman}' is not a council provider; the highest-rated provider will chair"
            )));
        }

        if self.council.providers.len() < self.council.min_providers {
            issues.push(ConfigIssue::warning(format!(
                "council.providers: {} configured, council needs at least {}",
                self.council.providers.len(),
                self.council.min_providers
            )));
        }

        let mut seen = Vec::new();
        for provider in &self.council.providers {
            if seen.contains(&provider) {
                issues.push(ConfigIssue::warning(format!(
                    "council.providers: '{provider}' is listed twice"
                )));
            }
            seen.push(provider);
        }

        if !(0.0..=1.0).contains(&self.consensus.synthesis_threshold) {
            issues.push(ConfigIssue::warning(format!(
                "consensus.synthesis_threshold: {} is outside 0..=1",
                self.consensus.synthesis_threshold
            )));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[council]
providers = ["azure", "google"]
chairman_provider = "google"
min_providers = 2

[consensus]
provider = "anthropic"
synthesis_threshold = 0.7

[server]
host = "0.0.0.0"
port = 9000

[history]
enabled = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.council.providers, vec![Provider::Azure, Provider::Google]);
        assert_eq!(config.consensus.provider, Provider::Anthropic);
        assert_eq!(config.server.bind_address(), "0.0.0.0:9000");
        assert!(!config.history.enabled);
        assert!(config.validate().is_empty());

        let debate = config.debate_config();
        assert_eq!(debate.chairman_provider, Some(Provider::Google));
        assert_eq!(debate.synthesis_threshold, 0.7);
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert_eq!(config.council.providers, Provider::default_providers());
        assert_eq!(config.consensus.provider, Provider::Azure);
        assert_eq!(config.server.port, 8000);
        assert!(config.history.enabled);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_problems() {
        let toml_str = r#"
[council]
providers = ["azure", "mystery"]
chairman_provider = "openai"
min_providers = 3
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();

        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));
        assert!(issues[0].message.contains("mystery"));
        assert!(issues[1].message.contains("openai"));
        assert!(issues[2].message.contains("at least 3"));
    }

    #[test]
    fn test_unknown_consensus_provider_is_an_error() {
        let toml_str = r#"
[consensus]
provider = "mystery"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
    }
}

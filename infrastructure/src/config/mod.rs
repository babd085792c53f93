//! Configuration file loading for debate-console
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `DEBATE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./debate.toml` or `./.debate.toml`
//! 4. Global: `$XDG_CONFIG_HOME/debate-console/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, FileConfig, FileConsensusConfig, FileCouncilConfig, FileHistoryConfig,
    FileProviderConfig, FileProvidersConfig, FileServerConfig, ProviderSettings, Severity,
};
pub use loader::{ConfigError, ConfigLoader};

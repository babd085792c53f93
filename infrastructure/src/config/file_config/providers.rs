//! Provider configuration from TOML (`[providers]` section)
//!
//! Every field is optional; unset fields fall back to per-provider defaults
//! when the adapter is built (see [`FileProviderConfig::resolve`]).
//!
//! ```toml
//! [providers.azure]
//! base_url = "https://my-resource.openai.azure.com"
//! model = "gpt-4-turbo"          # deployment name
//!
//! [providers.anthropic]
//! model = "claude-sonnet-4-5-20250929"
//!
//! [providers.custom.local]
//! base_url = "http://localhost:11434"
//! model = "llama3"
//! ```

use debate_domain::Provider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_MAX_TOKENS: u32 = 2500;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Raw settings for one provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Direct API key (prefer `api_key_env`)
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Model name (deployment name for Azure)
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    /// API version (Anthropic header / Azure query parameter)
    pub api_version: Option<String>,
}

/// Fully resolved provider settings
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub api_version: Option<String>,
}

struct Defaults {
    api_key_env: &'static str,
    base_url: Option<&'static str>,
    model: &'static str,
    api_version: Option<&'static str>,
}

fn defaults_for(provider: &Provider) -> Defaults {
    match provider {
        Provider::Azure => Defaults {
            api_key_env: "AZURE_OPENAI_API_KEY",
            base_url: None,
            model: "gpt-4-turbo",
            api_version: Some("2024-12-01-preview"),
        },
        Provider::Anthropic => Defaults {
            api_key_env: "ANTHROPIC_API_KEY",
            base_url: Some("https://api.anthropic.com"),
            model: "claude-sonnet-4-5-20250929",
            api_version: Some("2023-06-01"),
        },
        Provider::Google => Defaults {
            api_key_env: "GOOGLE_API_KEY",
            base_url: Some("https://generativelanguage.googleapis.com"),
            model: "gemini-3-pro-preview",
            api_version: None,
        },
        Provider::OpenAi => Defaults {
            api_key_env: "OPENAI_API_KEY",
            base_url: Some("https://api.openai.com"),
            model: "gpt-4o",
            api_version: None,
        },
        Provider::Custom(_) => Defaults {
            api_key_env: "",
            base_url: None,
            model: "",
            api_version: None,
        },
    }
}

impl FileProviderConfig {
    /// Fill unset fields with the defaults of `provider`.
    pub fn resolve(&self, provider: &Provider) -> ProviderSettings {
        let defaults = defaults_for(provider);
        ProviderSettings {
            api_key_env: self
                .api_key_env
                .clone()
                .unwrap_or_else(|| defaults.api_key_env.to_string()),
            api_key: self.api_key.clone(),
            base_url: self
                .base_url
                .clone()
                .or_else(|| defaults.base_url.map(str::to_string)),
            model: self
                .model
                .clone()
                .unwrap_or_else(|| defaults.model.to_string()),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            api_version: self
                .api_version
                .clone()
                .or_else(|| defaults.api_version.map(str::to_string)),
        }
    }
}

impl ProviderSettings {
    /// API key from the config file, else from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| {
            if self.api_key_env.is_empty() {
                return None;
            }
            std::env::var(&self.api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty())
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub azure: FileProviderConfig,
    pub anthropic: FileProviderConfig,
    pub google: FileProviderConfig,
    pub openai: FileProviderConfig,
    /// OpenAI-compatible backends, keyed by provider name
    pub custom: BTreeMap<String, FileProviderConfig>,
}

impl FileProvidersConfig {
    /// Raw section for `provider`, if there can be one
    pub fn get(&self, provider: &Provider) -> Option<&FileProviderConfig> {
        match provider {
            Provider::Azure => Some(&self.azure),
            Provider::Anthropic => Some(&self.anthropic),
            Provider::Google => Some(&self.google),
            Provider::OpenAi => Some(&self.openai),
            Provider::Custom(name) => self.custom.get(name),
        }
    }

    /// Resolved settings for `provider`; `None` for an undeclared custom name
    pub fn settings(&self, provider: &Provider) -> Option<ProviderSettings> {
        self.get(provider).map(|raw| raw.resolve(provider))
    }

    /// Every provider that has a section, built-ins first
    pub fn known_providers(&self) -> Vec<Provider> {
        let mut providers = vec![
            Provider::Azure,
            Provider::Anthropic,
            Provider::Google,
            Provider::OpenAi,
        ];
        providers.extend(self.custom.keys().map(|name| Provider::Custom(name.clone())));
        providers
    }
}

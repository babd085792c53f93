//! Provider value object representing a text-generation backend

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Generation backends that can take part in a debate (Value Object)
///
/// The consensus method runs all four executives on one provider; the
/// council method asks every enabled provider the same question and lets
/// them review each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Provider {
    /// Azure-hosted OpenAI deployment
    Azure,
    /// Anthropic Messages API
    Anthropic,
    /// Google Gemini API
    Google,
    /// OpenAI Chat Completions API
    OpenAi,
    /// Any other backend registered by name
    Custom(String),
}

impl Provider {
    /// Get the string identifier for this provider
    pub fn as_str(&self) -> &str {
        match self {
            Provider::Azure => "azure",
            Provider::Anthropic => "anthropic",
            Provider::Google => "google",
            Provider::OpenAi => "openai",
            Provider::Custom(s) => s,
        }
    }

    /// Human-readable name shown in the console and events
    pub fn display_name(&self) -> &str {
        match self {
            Provider::Azure => "Azure OpenAI",
            Provider::Anthropic => "Anthropic Claude",
            Provider::Google => "Google Gemini",
            Provider::OpenAi => "OpenAI",
            Provider::Custom(s) => s,
        }
    }

    /// Rough cost in USD per 1k tokens, used for pre-flight estimates
    pub fn cost_per_1k_tokens(&self) -> f64 {
        match self {
            Provider::Azure => 0.03,
            Provider::Anthropic => 0.015,
            Provider::Google => 0.00125,
            Provider::OpenAi => 0.01,
            Provider::Custom(_) => 0.0,
        }
    }

    /// Resolve a provider from its configured name, accepting common aliases
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "azure" | "azure-openai" => Provider::Azure,
            "anthropic" | "claude" => Provider::Anthropic,
            "google" | "gemini" => Provider::Google,
            "openai" => Provider::OpenAi,
            _ => Provider::Custom(name.trim().to_string()),
        }
    }

    /// Get the default council line-up
    pub fn default_providers() -> Vec<Provider> {
        vec![Provider::Azure, Provider::Anthropic, Provider::Google]
    }
}

impl Default for Provider {
    /// Returns the default provider (Azure), which also runs the executives
    fn default() -> Self {
        Provider::Azure
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Provider::from_name(s))
    }
}

impl Serialize for Provider {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Provider {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Provider::from_name(&s))
    }
}

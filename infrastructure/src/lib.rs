//! Infrastructure layer for debate-console
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: provider HTTP clients, configuration file
//! loading, snapshot history and the event transcript.

pub mod config;
pub mod history;
pub mod logging;
pub mod providers;

// Re-export commonly used types
pub use config::{ConfigError, ConfigIssue, ConfigLoader, FileConfig, Severity};
pub use history::JsonFileDebateRepository;
pub use logging::JsonlEventLogger;
pub use providers::{ProviderAdapter, error::ProviderError, routing::RoutingGateway};

//! Application layer for debate-console
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::DebateConfig;
pub use ports::{
    debate_repository::{DebateRepository, NoRepository, RepositoryError},
    event_emitter::{CompositeEmitter, EventEmitter, NoEmitter},
    llm_gateway::{GatewayError, LlmGateway, LlmSession, SessionOptions, StreamHandle},
};
pub use use_cases::run_debate::{RunDebateError, RunDebateUseCase};
pub use use_cases::session_registry::SessionRegistry;

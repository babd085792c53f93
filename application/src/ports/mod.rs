//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement.

pub mod debate_repository;
pub mod event_emitter;
pub mod llm_gateway;

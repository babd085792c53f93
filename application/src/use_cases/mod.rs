//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod executor;
pub mod generation;
pub mod run_consensus;
pub mod run_council;
pub mod run_debate;
pub mod session_registry;
pub mod synthesize;

#[cfg(test)]
pub(crate) mod test_support;

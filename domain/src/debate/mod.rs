//! Debate domain
//!
//! The session aggregate, its generation tasks, the two evaluators
//! (lexicon-scored consensus and peer-reviewed council), the synthesized
//! decision, and the progress events clients receive.

pub mod comparison;
pub mod consensus;
pub mod council;
pub mod decision;
pub mod divergence;
pub mod estimate;
pub mod event;
pub mod lexicon;
pub mod session;
pub mod task;

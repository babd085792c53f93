//! Application-level configuration.
//!
//! - [`DebateConfig`]: which providers take part and how the evaluators are tuned

pub mod debate_config;

pub use debate_config::DebateConfig;

//! Executive personas and the structured outputs they produce.
//!
//! - [`role::Role`]: the four fixed executive seats of the consensus method
//! - [`output::StructuredOutput`]: tagged per-identity result, with a raw fallback

pub mod output;
pub mod role;

pub use output::{
    CfoAnalysis, CpoAnalysis, CroAnalysis, CtoAnalysis, ProviderAnalysis, StructuredOutput,
};
pub use role::Role;

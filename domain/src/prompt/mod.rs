//! Prompt domain
//!
//! Persona, synthesis, peer-review and chairman prompts for both debate methods.

mod template;

pub use template::{PromptTemplate, anonymous_label};

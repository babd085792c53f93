//! Core domain concepts shared across all subdomains.
//!
//! - [`provider::Provider`]: generation backends (Azure, Anthropic, Gemini, ...)
//! - [`question::Question`]: the validated decision under review
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod provider;
pub mod question;

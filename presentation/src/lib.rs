//! Presentation layer for debate-console
//!
//! This crate contains CLI definitions, the websocket server, output
//! formatters and progress reporters.

pub mod cli;
pub mod output;
pub mod progress;
pub mod server;

// Re-export commonly used types
pub use cli::commands::{AskArgs, Cli, Command, HistoryCommand, OutputFormat, ServeArgs};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
pub use server::{ServerState, SessionHub, build_router, serve};

//! Logging infrastructure: the machine-readable event transcript.
//!
//! Provides [`JsonlEventLogger`], a JSONL file writer that implements
//! the [`EventEmitter`](debate_application::EventEmitter) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlEventLogger;

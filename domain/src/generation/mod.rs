//! Generation stream primitives shared by the gateway port and its adapters.

pub mod stream;

pub use stream::StreamEvent;

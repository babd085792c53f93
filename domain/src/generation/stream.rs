//! Streaming events for a single generation call.

/// An event in a streaming generation response.
///
/// Adapters translate transport chunks (SSE deltas, websocket frames) into
/// these events; `Completed` or `Error` ends the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A text chunk from the model
    Delta(String),
    /// The complete response text (signals stream end)
    Completed(String),
    /// An error that occurred during streaming
    Error(String),
}

impl StreamEvent {
    /// Returns the text content if this is a Delta or Completed event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) | StreamEvent::Completed(s) => Some(s),
            StreamEvent::Error(_) => None,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, StreamEvent::Completed(_) | StreamEvent::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_accessor() {
        assert_eq!(StreamEvent::Delta("a".into()).text(), Some("a"));
        assert_eq!(StreamEvent::Error("x".into()).text(), None);
        assert!(StreamEvent::Completed(String::new()).is_final());
        assert!(!StreamEvent::Delta(String::new()).is_final());
    }
}

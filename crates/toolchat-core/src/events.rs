//! Session Events
//!
//! The session loop reports everything worth showing through [`ChatEvent`].
//! Rendering is left to an [`EventHandler`]; the console front-end colors
//! them, tests record them.

use serde_json::{Map, Value};

use crate::provider::TokenUsage;

/// Events emitted while a conversation is running
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChatEvent<'a> {
    /// The user's input was empty and has been rejected
    EmptyPrompt,
    /// A prompt was accepted and is about to be sent
    PromptAccepted(&'a str),
    /// First thinking delta of a reasoning region
    ThinkingStarted,
    ThinkingDelta(&'a str),
    /// Reasoning region closed by content, a tool call, or end of stream
    ThinkingEnded,
    ContentDelta(&'a str),
    /// The model asked for a tool while streaming
    ToolCallReceived {
        name: &'a str,
        arguments: &'a Map<String, Value>,
    },
    /// A tool is about to run
    ToolInvoking {
        name: &'a str,
        arguments: &'a Map<String, Value>,
    },
    ToolSucceeded { name: &'a str, output: &'a str },
    ToolFailed { name: &'a str, message: &'a str },
    /// Token accounting for the finished response
    Usage {
        usage: TokenUsage,
        context_size: u32,
    },
    SummaryStarted,
    SummaryDelta(&'a str),
    SummaryEnded,
    /// The model finished answering and control returns to the user
    TurnComplete,
    /// The request failed and was abandoned
    RequestFailed(&'a str),
}

/// Observer for [`ChatEvent`]s
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &ChatEvent<'_>);
}

/// Ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl EventHandler for NoopHandler {
    fn on_event(&self, _event: &ChatEvent<'_>) {}
}

/// Logs events through `tracing` at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &ChatEvent<'_>) {
        match event {
            ChatEvent::ToolInvoking { name, .. } => tracing::debug!(tool = name, "Invoking tool"),
            ChatEvent::ToolFailed { name, message } => {
                tracing::debug!(tool = name, error = message, "Tool failed");
            }
            ChatEvent::Usage { usage, context_size } => tracing::debug!(
                prompt = usage.prompt_tokens,
                generated = usage.generated_tokens,
                context_size,
                "Token usage"
            ),
            ChatEvent::RequestFailed(message) => tracing::debug!(error = message, "Request failed"),
            _ => tracing::trace!(?event, "Chat event"),
        }
    }
}

/// Fans each event out to several handlers, in order
#[derive(Default)]
pub struct CompositeEventHandler {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }
}

impl EventHandler for CompositeEventHandler {
    fn on_event(&self, event: &ChatEvent<'_>) {
        for handler in &self.handlers {
            handler.on_event(event);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingHandler;
    use super::*;
    use std::sync::Arc;

    struct Shared(Arc<RecordingHandler>);

    impl EventHandler for Shared {
        fn on_event(&self, event: &ChatEvent<'_>) {
            self.0.on_event(event);
        }
    }

    #[test]
    fn composite_forwards_to_all() {
        let a = Arc::new(RecordingHandler::default());
        let b = Arc::new(RecordingHandler::default());
        let composite = CompositeEventHandler::new()
            .with(Shared(Arc::clone(&a)))
            .with(NoopHandler)
            .with(Shared(Arc::clone(&b)));

        composite.on_event(&ChatEvent::ContentDelta("hi"));
        composite.on_event(&ChatEvent::TurnComplete);

        assert_eq!(a.take(), ["content:hi", "done"]);
        assert_eq!(b.take(), ["content:hi", "done"]);
    }
}

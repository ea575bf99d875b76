//! Fragment Accumulation
//!
//! Folds a response stream into one assistant turn while emitting the
//! thinking markers as regions open and close.

use crate::events::{ChatEvent, EventHandler};
use crate::provider::{Fragment, TokenUsage};
use crate::tool::ToolCall;

/// Parts of a finished response
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssembledTurn {
    pub thinking: String,
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<TokenUsage>,
}

/// Accumulates fragments for one response
#[derive(Debug, Default)]
pub struct TurnAccumulator {
    parts: AssembledTurn,
    in_thinking: bool,
    done: bool,
}

impl TurnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a fragment marked `done` has been seen
    pub const fn is_done(&self) -> bool {
        self.done
    }

    pub fn fold(&mut self, fragment: Fragment, handler: &dyn EventHandler) {
        if let Some(thinking) = fragment.thinking.filter(|t| !t.is_empty()) {
            if !self.in_thinking {
                self.in_thinking = true;
                handler.on_event(&ChatEvent::ThinkingStarted);
            }
            handler.on_event(&ChatEvent::ThinkingDelta(&thinking));
            self.parts.thinking.push_str(&thinking);
        }

        if let Some(content) = fragment.content.filter(|c| !c.is_empty()) {
            self.close_thinking(handler);
            handler.on_event(&ChatEvent::ContentDelta(&content));
            self.parts.content.push_str(&content);
        }

        for call in fragment.tool_calls {
            self.close_thinking(handler);
            handler.on_event(&ChatEvent::ToolCallReceived {
                name: &call.name,
                arguments: &call.arguments,
            });
            self.parts.tool_calls.push(call);
        }

        if let Some(usage) = fragment.usage {
            self.parts.usage = Some(usage);
        }
        self.done |= fragment.done;
    }

    /// Close any open thinking region and hand back the parts
    pub fn finish(mut self, handler: &dyn EventHandler) -> AssembledTurn {
        self.close_thinking(handler);
        self.parts
    }

    fn close_thinking(&mut self, handler: &dyn EventHandler) {
        if self.in_thinking {
            self.in_thinking = false;
            handler.on_event(&ChatEvent::ThinkingEnded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::testing::RecordingHandler;
    use serde_json::Map;

    fn fold_all(fragments: Vec<Fragment>, handler: &RecordingHandler) -> AssembledTurn {
        let mut acc = TurnAccumulator::new();
        for f in fragments {
            acc.fold(f, handler);
        }
        acc.finish(handler)
    }

    #[test]
    fn thinking_then_content_has_one_marker_pair() {
        let handler = RecordingHandler::default();
        let turn = fold_all(
            vec![
                Fragment::thinking("a"),
                Fragment::thinking("b"),
                Fragment::content("c"),
                Fragment::content("d"),
                Fragment::done(None),
            ],
            &handler,
        );

        assert_eq!(turn.thinking, "ab");
        assert_eq!(turn.content, "cd");
        assert_eq!(
            handler.take(),
            ["<think>", "think:a", "think:b", "</think>", "content:c", "content:d"]
        );
    }

    #[test]
    fn tool_call_closes_thinking() {
        let handler = RecordingHandler::default();
        let turn = fold_all(
            vec![
                Fragment::thinking("plan"),
                Fragment::tool_calls(vec![
                    ToolCall::new("A", Map::new()),
                    ToolCall::new("B", Map::new()),
                ]),
            ],
            &handler,
        );

        let names: Vec<_> = turn.tool_calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(
            handler.take(),
            ["<think>", "think:plan", "</think>", "call:A", "call:B"]
        );
    }

    #[test]
    fn open_region_is_closed_at_finish() {
        let handler = RecordingHandler::default();
        fold_all(vec![Fragment::thinking("only thoughts")], &handler);
        assert_eq!(handler.take(), ["<think>", "think:only thoughts", "</think>"]);
    }

    #[test]
    fn empty_deltas_are_ignored() {
        let handler = RecordingHandler::default();
        let turn = fold_all(
            vec![Fragment::thinking(""), Fragment::content(""), Fragment::content("x")],
            &handler,
        );
        assert_eq!(turn.thinking, "");
        assert_eq!(handler.take(), ["content:x"]);
    }

    #[test]
    fn usage_and_done_are_recorded() {
        let handler = RecordingHandler::default();
        let mut acc = TurnAccumulator::new();
        acc.fold(Fragment::content("hi"), &handler);
        assert!(!acc.is_done());
        let usage = TokenUsage {
            prompt_tokens: 10,
            generated_tokens: 2,
        };
        acc.fold(Fragment::done(Some(usage)), &handler);
        assert!(acc.is_done());
        assert_eq!(acc.finish(&handler).usage, Some(usage));
    }
}

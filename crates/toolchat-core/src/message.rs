//! Conversation Turns
//!
//! Standard turn format shared by the session loop and the transports.

use serde::{Deserialize, Serialize};

use crate::tool::ToolCall;

/// Role of a turn's author
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// A single turn in a conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,

    /// Text content
    pub content: String,

    /// Reasoning text (assistant only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,

    /// Tool calls requested by the assistant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Which tool produced this result (tool only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Turn {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            thinking: None,
            tool_calls: Vec::new(),
            tool_name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Assistant reply. Empty thinking is dropped.
    pub fn assistant(
        content: impl Into<String>,
        thinking: Option<String>,
        tool_calls: Vec<ToolCall>,
    ) -> Self {
        Self {
            thinking: thinking.filter(|t| !t.is_empty()),
            tool_calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Result of running `tool_name`
    pub fn tool_result(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_name: Some(tool_name.into()),
            ..Self::new(Role::Tool, content)
        }
    }

    /// An assistant turn with tool calls needs another round trip
    pub fn needs_tool_round(&self) -> bool {
        self.role == Role::Assistant && !self.tool_calls.is_empty()
    }
}

/// Conversation history, oldest turn first
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let mut conv = Self::new();
        conv.push(Turn::system(prompt));
        conv
    }

    /// Append a turn
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn extend(&mut self, turns: impl IntoIterator<Item = Turn>) {
        self.turns.extend(turns);
    }

    /// Drop every turn after the first `len`
    pub fn truncate(&mut self, len: usize) {
        self.turns.truncate(len);
    }

    /// All turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Get the last turn
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    #[test]
    fn turn_constructors() {
        let turn = Turn::user("Hello");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "Hello");
        assert!(!turn.needs_tool_round());

        let result = Turn::tool_result("GetCountiesInState", "none");
        assert_eq!(result.role, Role::Tool);
        assert_eq!(result.tool_name.as_deref(), Some("GetCountiesInState"));
    }

    #[test]
    fn assistant_with_calls_needs_round() {
        let call = ToolCall::new("GetCountiesInState", Map::new());
        let turn = Turn::assistant("", Some(String::new()), vec![call]);
        assert!(turn.needs_tool_round());
        assert_eq!(turn.thinking, None);
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let value = serde_json::to_value(Turn::user("hi")).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn conversation_appends_in_order() {
        let mut conv = Conversation::with_system_prompt("You are helpful.");
        conv.push(Turn::user("Hi"));
        conv.push(Turn::assistant("Hello!", None, Vec::new()));

        assert_eq!(conv.len(), 3);
        assert_eq!(conv.turns()[0].role, Role::System);
        assert_eq!(conv.last().unwrap().role, Role::Assistant);
    }
}

//! Tool System
//!
//! Host functions the model may call. Each tool declares a [`ToolDescriptor`]
//! up front and receives already-coerced [`Arguments`] when invoked.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;
use std::future::Future;

use crate::args::Arguments;
use crate::error::{Result, ToolError};
use crate::schema::ToolDescriptor;

/// Tool call request from the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call ID for tracking
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Raw arguments as sent by the model
    #[serde(default)]
    pub arguments: Map<String, Value>,

    /// Argument text that could not be decoded into an object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unparsed_arguments: Option<String>,
}

impl ToolCall {
    /// New call with a generated ID
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            arguments,
            unparsed_arguments: None,
        }
    }

    /// A call whose arguments arrived in a shape that is not a JSON object.
    /// Invoking it reports the problem back to the model.
    pub fn unparsed(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            unparsed_arguments: Some(raw.into()),
            ..Self::new(name, Map::new())
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn arguments_display(&self) -> String {
        self.unparsed_arguments
            .clone()
            .unwrap_or_else(|| format_arguments(&self.arguments))
    }
}

/// `(key: value), (key: value)` rendering used in console traces
pub fn format_arguments(arguments: &Map<String, Value>) -> String {
    arguments
        .iter()
        .map(|(k, v)| match v {
            Value::String(s) => format!("({k}: {s})"),
            other => format!("({k}: {other})"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Descriptor advertised to the model. Called once at registration.
    fn descriptor(&self) -> Result<ToolDescriptor>;

    /// Run the tool with arguments already coerced to their declared types
    async fn call(&self, args: Arguments) -> std::result::Result<String, ToolError>;
}

/// Adapts an async closure into a [`Tool`]
pub struct FnTool<F> {
    descriptor: ToolDescriptor,
    handler: F,
}

impl<F> FnTool<F> {
    pub const fn new(descriptor: ToolDescriptor, handler: F) -> Self {
        Self { descriptor, handler }
    }
}

#[async_trait]
impl<F, Fut, R> Tool for FnTool<F>
where
    F: Fn(Arguments) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<R, ToolError>> + Send,
    R: Display,
{
    fn descriptor(&self) -> Result<ToolDescriptor> {
        Ok(self.descriptor.clone())
    }

    async fn call(&self, args: Arguments) -> std::result::Result<String, ToolError> {
        (self.handler)(args).await.map(|out| out.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generated_ids_are_unique() {
        let a = ToolCall::new("A", Map::new());
        let b = ToolCall::new("A", Map::new());
        assert_ne!(a.id, b.id);
        assert_eq!(a.clone().with_id("call_1").id, "call_1");
    }

    #[test]
    fn arguments_display_format() {
        let args = json!({"location": "Paris", "days": 3});
        let call = ToolCall::new("Forecast", args.as_object().cloned().unwrap());
        assert_eq!(call.arguments_display(), "(days: 3), (location: Paris)");
    }
}

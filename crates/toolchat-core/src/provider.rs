//! LLM Provider Abstraction
//!
//! The session loop talks to the model server only through [`LlmProvider`].
//! A provider turns a [`ChatRequest`] into a stream of [`Fragment`]s; a
//! non-streaming request is simply a stream with a single fragment.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use toolchat_core::provider::{ChatRequest, LlmProvider};
//!
//! let provider = OllamaProvider::new(config)?;
//! let mut stream = provider.chat_stream(&request).await?;
//! while let Some(fragment) = stream.next().await { /* ... */ }
//! ```

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::error::Result;
use crate::message::Turn;
use crate::schema::ToolDescriptor;
use crate::tool::ToolCall;

/// Sampling options sent with every request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for sampling (0.0 = deterministic)
    #[serde(default)]
    pub temperature: f32,

    /// Context window size in tokens
    #[serde(default = "default_num_ctx")]
    pub num_ctx: u32,

    /// Ask reasoning models to think (or not). `None` leaves it to the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub think: Option<bool>,
}

const fn default_num_ctx() -> u32 {
    4096
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            num_ctx: default_num_ctx(),
            think: None,
        }
    }
}

/// Everything needed for one round trip to the model
#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub model: String,

    /// Full history, oldest first
    pub turns: Vec<Turn>,

    /// Advertised tools; empty when tool calling is disabled
    pub tools: Vec<ToolDescriptor>,

    /// Whether the server should stream fragments
    pub stream: bool,

    pub options: GenerationOptions,
}

/// Token accounting reported at the end of a response
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub generated_tokens: u32,
}

impl TokenUsage {
    pub const fn total(&self) -> u32 {
        self.prompt_tokens + self.generated_tokens
    }
}

/// One incremental piece of a response
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fragment {
    pub thinking: Option<String>,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,

    /// Typically only on the final fragment
    pub usage: Option<TokenUsage>,

    /// Whether this is the final fragment
    pub done: bool,
}

impl Fragment {
    pub fn thinking(text: impl Into<String>) -> Self {
        Self {
            thinking: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::default()
        }
    }

    pub fn done(usage: Option<TokenUsage>) -> Self {
        Self {
            usage,
            done: true,
            ..Self::default()
        }
    }
}

/// Stream type for chat responses
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment>> + Send>>;

/// Information about a locally available model
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub size_bytes: Option<u64>,
    pub parameter_size: Option<String>,
}

/// Strategy trait for model servers
///
/// Implement this trait to add support for new backends.
/// The session loop works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name, for logs
    fn name(&self) -> &str;

    /// Check if the server is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Open a response stream for `request`
    async fn chat_stream(&self, request: &ChatRequest) -> Result<FragmentStream>;

    /// List available models
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!(opts.temperature.abs() < f32::EPSILON);
        assert_eq!(opts.num_ctx, 4096);
        assert_eq!(opts.think, None);
    }

    #[test]
    fn usage_total() {
        let usage = TokenUsage {
            prompt_tokens: 120,
            generated_tokens: 30,
        };
        assert_eq!(usage.total(), 150);
    }
}

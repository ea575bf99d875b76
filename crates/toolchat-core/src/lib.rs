//! # toolchat-core
//!
//! Tool-calling bridge and streaming conversation loop for chatting with a
//! local model server.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ChatSession                           │
//! │  ┌─────────────┐  ┌──────────────┐  ┌─────────────────────┐  │
//! │  │  LoopState  │  │ ToolRegistry │  │   LlmProvider       │  │
//! │  │  + stream   │──│  + coercion  │──│   (Strategy)        │  │
//! │  └─────────────┘  └──────────────┘  └─────────────────────┘  │
//! │         │                                                    │
//! │  ┌──────────────────┐   ┌────────────────┐                   │
//! │  │ThoughtSummarizer │   │  EventHandler  │                   │
//! │  └──────────────────┘   └────────────────┘                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait keeps the loop independent of the transport; the
//! `EventHandler` trait keeps it independent of the console.

pub mod args;
pub mod error;
pub mod events;
pub mod message;
pub mod provider;
pub mod registry;
pub mod retry;
pub mod schema;
pub mod session;
pub mod stream;
pub mod summarizer;
pub mod tool;

#[cfg(test)]
mod testing;

pub use args::{ArgValue, Arguments};
pub use error::{ChatError, Result, ToolError};
pub use events::{ChatEvent, EventHandler, NoopHandler};
pub use message::{Conversation, Role, Turn};
pub use provider::{ChatRequest, Fragment, FragmentStream, GenerationOptions, LlmProvider, TokenUsage};
pub use registry::ToolRegistry;
pub use retry::RetryConfig;
pub use schema::{ParameterDescriptor, ToolDescriptor, ToolEnum};
pub use session::{ChatSession, PromptSource, SessionConfig};
pub use tool::{FnTool, Tool, ToolCall};

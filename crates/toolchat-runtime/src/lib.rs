//! # toolchat-runtime
//!
//! Runtime providers for toolchat.
//!
//! ## Providers
//!
//! - **Ollama**: local inference through `/api/chat` (NDJSON streaming) and
//!   `/api/tags`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use toolchat_runtime::{OllamaConfig, OllamaProvider};
//!
//! let provider = OllamaProvider::from_config(OllamaConfig::from_env())?;
//! let session = ChatSession::new(Arc::new(provider), registry, handler, config);
//! ```

pub mod ollama;
mod wire;

pub use ollama::{OllamaConfig, OllamaProvider};

// Re-export core types for convenience
pub use toolchat_core::{ChatError, ChatRequest, FragmentStream, LlmProvider, Result};

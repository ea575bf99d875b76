//! Command-line and environment configuration
//!
//! Every option can be given as a flag or through the environment (a `.env`
//! file in the working directory is loaded first).

use clap::{ArgAction, Parser};
use std::time::Duration;

use toolchat_core::{GenerationOptions, RetryConfig, SessionConfig};
use toolchat_runtime::OllamaConfig;

/// Chat with a local Ollama model that can call host tools.
#[derive(Parser, Debug, Clone)]
#[command(name = "toolchat", version)]
pub struct Cli {
    // ── Server ─────────────────────────────────────────────────
    /// Ollama host URL
    #[arg(long, env = "OLLAMA_HOST", default_value = "http://localhost")]
    pub host: String,

    /// Ollama port
    #[arg(long, env = "OLLAMA_PORT", default_value_t = 11434)]
    pub port: u16,

    /// Total HTTP request timeout in seconds
    #[arg(long, env = "TOOLCHAT_TIMEOUT_SECS", default_value_t = 600)]
    pub timeout_secs: u64,

    /// Attempts when opening a response stream
    #[arg(long, env = "TOOLCHAT_RETRIES", default_value_t = 3)]
    pub retries: u32,

    // ── Model ──────────────────────────────────────────────────
    /// Model to chat with
    #[arg(long, env = "TOOLCHAT_MODEL", default_value = "qwen3-vl:4b")]
    pub model: String,

    /// Sampling temperature (0.0 = deterministic)
    #[arg(long, env = "TOOLCHAT_TEMPERATURE", default_value_t = 0.0)]
    pub temperature: f32,

    /// Context window size in tokens
    #[arg(
        long,
        env = "TOOLCHAT_CONTEXT_SIZE",
        default_value_t = 4096,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub context_size: u32,

    /// Ask reasoning models to think (true) or not (false); unset leaves it to the server
    #[arg(long, env = "TOOLCHAT_THINK")]
    pub think: Option<bool>,

    /// System prompt placed at the start of the conversation
    #[arg(long, env = "TOOLCHAT_SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,

    // ── Behavior ───────────────────────────────────────────────
    /// Advertise the host tools to the model
    #[arg(long, env = "TOOLCHAT_ENABLE_TOOLS", default_value_t = true, action = ArgAction::Set)]
    pub enable_tools: bool,

    /// Stream tokens as they are generated
    #[arg(long, env = "TOOLCHAT_STREAM", default_value_t = false, action = ArgAction::Set)]
    pub stream: bool,

    /// Carry earlier exchanges into later prompts
    #[arg(long, env = "TOOLCHAT_KEEP_HISTORY", default_value_t = false, action = ArgAction::Set)]
    pub keep_history: bool,

    /// Upper bound on a single tool invocation, in seconds
    #[arg(long, env = "TOOLCHAT_TOOL_TIMEOUT_SECS", default_value_t = 30)]
    pub tool_timeout_secs: u64,
}

impl Cli {
    pub fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig {
            host: self.host.clone(),
            port: self.port,
            timeout_secs: self.timeout_secs,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            model: self.model.clone(),
            enable_tools: self.enable_tools,
            stream: self.stream,
            options: GenerationOptions {
                temperature: self.temperature,
                num_ctx: self.context_size,
                think: self.think,
            },
            retry: RetryConfig::with_attempts(self.retries),
            system_prompt: self.system_prompt.clone().filter(|p| !p.trim().is_empty()),
            keep_history: self.keep_history,
        }
    }

    pub const fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

//! toolchat
//!
//! Interactive console client for a local Ollama server. The model can call
//! the host tools from `toolchat-tools` mid-conversation; thinking, answers
//! and tool traces are rendered as they arrive.

mod config;
mod console;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use toolchat_core::{ChatSession, LlmProvider};
use toolchat_runtime::OllamaProvider;

use crate::config::Cli;
use crate::console::{ConsoleHandler, LinePrompts};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before parsing so `.env` values act as defaults
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Logs go to stderr so they stay out of the conversation
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Initialize LLM provider
    let provider = Arc::new(OllamaProvider::from_config(cli.ollama_config())?);
    let base_url = provider.config().base_url();

    // Verify Ollama connection
    match provider.health_check().await {
        Ok(true) => {
            tracing::info!("Connected to Ollama at {}", base_url);
            if let Ok(models) = provider.list_models().await {
                for model in &models {
                    tracing::info!("  Model: {}", model.name);
                }
                if !models.iter().any(|m| m.name == cli.model) {
                    tracing::warn!("Model {} is not pulled locally; run `ollama pull {}`", cli.model, cli.model);
                }
            }
        }
        Ok(false) | Err(_) => {
            tracing::warn!("Ollama not available at {} - requests will fail", base_url);
            tracing::warn!("  Make sure Ollama is running: ollama serve");
        }
    }

    // Tools are registered once and shared read-only
    let registry = Arc::new(toolchat_tools::registry(cli.tool_timeout())?);

    let config = cli.session_config();
    tracing::info!(
        model = %config.model,
        tools = config.enable_tools,
        stream = config.stream,
        num_ctx = config.options.num_ctx,
        "Starting session"
    );

    let mut session = ChatSession::new(
        provider,
        registry,
        Arc::new(ConsoleHandler::stdout()),
        config,
    );
    session.run(&mut LinePrompts::stdin()).await?;

    Ok(())
}

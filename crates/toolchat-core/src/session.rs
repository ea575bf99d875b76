//! Conversation Loop
//!
//! Drives a conversation through its states:
//!
//! ```text
//! AwaitingUserInput ──▶ Requesting ──▶ Streaming ──┬──▶ AwaitingUserInput
//!                            ▲                     │
//!                            └────── ToolRound ◀───┘
//! ```
//!
//! Each response is folded into one assistant turn. If that turn requested
//! tools, every call runs in order, its result is appended as a tool turn,
//! and the history is sent back to the model. Control returns to the user
//! once a response arrives with no tool calls.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

use crate::error::Result;
use crate::events::{ChatEvent, EventHandler};
use crate::message::{Conversation, Turn};
use crate::provider::{ChatRequest, FragmentStream, GenerationOptions, LlmProvider};
use crate::registry::ToolRegistry;
use crate::retry::{RetryConfig, retry};
use crate::stream::{AssembledTurn, TurnAccumulator};
use crate::summarizer::ThoughtSummarizer;
use crate::tool::ToolCall;

/// Session configuration
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Model identifier, e.g. "qwen3-vl:4b"
    pub model: String,

    /// Advertise registered tools to the model
    pub enable_tools: bool,

    /// Ask the server to stream fragments
    pub stream: bool,

    pub options: GenerationOptions,

    /// Applied when opening a response stream
    pub retry: RetryConfig,

    /// Placed first in the history when set
    pub system_prompt: Option<String>,

    /// Carry earlier exchanges into later prompts. When off, every prompt
    /// starts from the system prompt alone.
    pub keep_history: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: "qwen3-vl:4b".into(),
            enable_tools: true,
            stream: false,
            options: GenerationOptions::default(),
            retry: RetryConfig::default(),
            system_prompt: None,
            keep_history: false,
        }
    }
}

/// Where user prompts come from
#[async_trait]
pub trait PromptSource: Send {
    /// Next line of input, or `None` once input is exhausted
    async fn next_prompt(&mut self) -> Result<Option<String>>;
}

/// States of the conversation loop
pub enum LoopState {
    AwaitingUserInput,
    Requesting,
    Streaming(FragmentStream),
    ToolRound(Vec<ToolCall>),
}

impl std::fmt::Debug for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingUserInput => f.write_str("AwaitingUserInput"),
            Self::Requesting => f.write_str("Requesting"),
            Self::Streaming(_) => f.write_str("Streaming"),
            Self::ToolRound(calls) => write!(f, "ToolRound({} calls)", calls.len()),
        }
    }
}

/// A single conversation with one model
pub struct ChatSession {
    provider: Arc<dyn LlmProvider>,
    registry: Arc<ToolRegistry>,
    summarizer: ThoughtSummarizer,
    handler: Arc<dyn EventHandler>,
    config: SessionConfig,
    conversation: Conversation,
}

impl ChatSession {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        registry: Arc<ToolRegistry>,
        handler: Arc<dyn EventHandler>,
        config: SessionConfig,
    ) -> Self {
        let summarizer = ThoughtSummarizer::new(
            Arc::clone(&provider),
            config.model.clone(),
            config.stream,
            config.options.clone(),
        );
        let conversation = initial_conversation(&config);

        Self {
            provider,
            registry,
            summarizer,
            handler,
            config,
            conversation,
        }
    }

    pub const fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Read prompts until input ends. Failed requests are reported and the
    /// loop goes back to waiting for input.
    pub async fn run(&mut self, input: &mut dyn PromptSource) -> Result<()> {
        loop {
            let Some(line) = input.next_prompt().await? else {
                tracing::info!("Input closed, ending session");
                return Ok(());
            };

            if line.trim().is_empty() {
                self.handler.on_event(&ChatEvent::EmptyPrompt);
                continue;
            }

            if let Err(e) = self.submit(&line).await {
                tracing::error!(error = %e, "Request failed");
                self.handler.on_event(&ChatEvent::RequestFailed(&e.user_message()));
            }
        }
    }

    /// Send one prompt and drive the loop until the model stops asking for
    /// tools. Returns the final answer text.
    ///
    /// On failure the history is left as it was before the prompt.
    pub async fn submit(&mut self, prompt: &str) -> Result<String> {
        self.handler.on_event(&ChatEvent::PromptAccepted(prompt));
        if !self.config.keep_history {
            self.conversation = initial_conversation(&self.config);
        }

        let mark = self.conversation.len();
        self.conversation.push(Turn::user(prompt));
        if let Err(e) = self.drive().await {
            self.conversation.truncate(mark);
            return Err(e);
        }

        self.handler.on_event(&ChatEvent::TurnComplete);
        Ok(self
            .conversation
            .last()
            .map(|turn| turn.content.clone())
            .unwrap_or_default())
    }

    async fn drive(&mut self) -> Result<()> {
        let mut state = LoopState::Requesting;
        loop {
            tracing::trace!(?state, "Loop step");
            state = match state {
                LoopState::AwaitingUserInput => break,
                LoopState::Requesting => LoopState::Streaming(self.open_stream().await?),
                LoopState::Streaming(stream) => {
                    let calls = self.consume(stream).await?;
                    if calls.is_empty() {
                        LoopState::AwaitingUserInput
                    } else {
                        LoopState::ToolRound(calls)
                    }
                }
                LoopState::ToolRound(calls) => {
                    let results = run_tool_round(&self.registry, &calls, self.handler.as_ref()).await;
                    self.conversation.extend(results);
                    LoopState::Requesting
                }
            };
        }
        Ok(())
    }

    fn build_request(&self) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            turns: self.conversation.turns().to_vec(),
            tools: if self.config.enable_tools {
                self.registry.descriptors()
            } else {
                Vec::new()
            },
            stream: self.config.stream,
            options: self.config.options.clone(),
        }
    }

    async fn open_stream(&self) -> Result<FragmentStream> {
        let request = self.build_request();
        tracing::debug!(
            model = %request.model,
            turns = request.turns.len(),
            tools = request.tools.len(),
            "Sending chat request"
        );
        retry(&self.config.retry, "chat", || self.provider.chat_stream(&request)).await
    }

    /// Fold the stream into an assistant turn and append it.
    /// Returns the tool calls the turn requested.
    async fn consume(&mut self, mut stream: FragmentStream) -> Result<Vec<ToolCall>> {
        let mut acc = TurnAccumulator::new();
        while let Some(fragment) = stream.next().await {
            let fragment = match fragment {
                Ok(fragment) => fragment,
                Err(e) => {
                    // close any open thinking region before bailing out
                    acc.finish(self.handler.as_ref());
                    return Err(e);
                }
            };
            acc.fold(fragment, self.handler.as_ref());
            if acc.is_done() {
                break;
            }
        }
        let AssembledTurn {
            thinking,
            content,
            tool_calls,
            usage,
        } = acc.finish(self.handler.as_ref());

        if let Some(usage) = usage {
            self.handler.on_event(&ChatEvent::Usage {
                usage,
                context_size: self.config.options.num_ctx,
            });
        }

        let thinking = if tool_calls.is_empty() {
            thinking
        } else {
            self.summarize_or_keep(thinking, &tool_calls).await
        };

        self.conversation
            .push(Turn::assistant(content, Some(thinking), tool_calls.clone()));
        Ok(tool_calls)
    }

    async fn summarize_or_keep(&self, thinking: String, calls: &[ToolCall]) -> String {
        match self
            .summarizer
            .summarize(&thinking, calls, self.handler.as_ref())
            .await
        {
            Ok(summary) if !summary.trim().is_empty() => summary,
            Ok(_) => thinking,
            Err(e) => {
                tracing::warn!(error = %e, "Summarizing thoughts failed, keeping raw thinking");
                thinking
            }
        }
    }
}

fn initial_conversation(config: &SessionConfig) -> Conversation {
    config
        .system_prompt
        .as_ref()
        .map_or_else(Conversation::new, Conversation::with_system_prompt)
}

/// Run every call in order and produce one tool-result turn per call.
///
/// Failures never abort the round; their message becomes the turn content.
pub async fn run_tool_round(
    registry: &ToolRegistry,
    calls: &[ToolCall],
    handler: &dyn EventHandler,
) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(calls.len());

    for call in calls {
        handler.on_event(&ChatEvent::ToolInvoking {
            name: &call.name,
            arguments: &call.arguments,
        });

        let content = match registry.invoke_call(call).await {
            Ok(output) => {
                handler.on_event(&ChatEvent::ToolSucceeded {
                    name: &call.name,
                    output: &output,
                });
                output
            }
            Err(e) => {
                handler.on_event(&ChatEvent::ToolFailed {
                    name: &call.name,
                    message: &e.to_string(),
                });
                e.as_tool_result()
            }
        };
        turns.push(Turn::tool_result(&call.name, content));
    }

    turns
}

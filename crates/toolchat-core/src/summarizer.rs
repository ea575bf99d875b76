//! Thought Summarizer
//!
//! When a response ends in tool calls, its reasoning is compressed before it
//! is stored in history. A secondary request (no tools) turns the raw
//! thinking plus the calls that were made into a short "what I did, what I
//! will do next" note.

use futures::StreamExt;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::{ChatError, Result};
use crate::events::{ChatEvent, EventHandler};
use crate::message::Turn;
use crate::provider::{ChatRequest, GenerationOptions, LlmProvider};
use crate::tool::ToolCall;

const SYSTEM_PROMPT: &str = "You will be given the train of thought of an LLM. \
Summarize it, keeping only the important and relevant thoughts and discarding everything else. \
Frame it as \"I did this, and these are what I will do next\". \
Be specific about exactly which methods were invoked, and give a numbered list of the future steps, if any.";

/// Compresses thinking transcripts with a secondary model call
pub struct ThoughtSummarizer {
    provider: Arc<dyn LlmProvider>,
    model: String,
    stream: bool,
    options: GenerationOptions,
}

impl ThoughtSummarizer {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        stream: bool,
        options: GenerationOptions,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            stream,
            options,
        }
    }

    /// Request sent to the model: fixed instructions plus thoughts and calls
    pub fn build_request(&self, thinking: &str, calls: &[ToolCall]) -> ChatRequest {
        let mut tools = String::new();
        for call in calls {
            let _ = write!(tools, "<tool><name>{}</name><arguments>", call.name);
            if let Some(raw) = &call.unparsed_arguments {
                tools.push_str(raw);
            }
            for (key, value) in &call.arguments {
                let value = value
                    .as_str()
                    .map_or_else(|| value.to_string(), ToOwned::to_owned);
                let _ = write!(
                    tools,
                    "<argument><arg>{key}</arg><value>{value}</value></argument>"
                );
            }
            tools.push_str("</arguments></tool>\n");
        }

        let user = format!(
            "<thoughts>\n{thinking}\n</thoughts>\n\n\
             The LLM invoked the following tools. Make sure the summary is written in the context of them:\n\
             <tools>\n{tools}</tools>"
        );

        ChatRequest {
            model: self.model.clone(),
            turns: vec![Turn::system(SYSTEM_PROMPT), Turn::user(user)],
            tools: Vec::new(),
            stream: self.stream,
            options: self.options.clone(),
        }
    }

    /// Summarize `thinking`, surfacing the summary text as it arrives.
    pub async fn summarize(
        &self,
        thinking: &str,
        calls: &[ToolCall],
        handler: &dyn EventHandler,
    ) -> Result<String> {
        let request = self.build_request(thinking, calls);
        let mut stream = self.provider.chat_stream(&request).await?;

        handler.on_event(&ChatEvent::SummaryStarted);
        let mut summary = String::new();
        let outcome = async {
            while let Some(fragment) = stream.next().await {
                if let Some(content) = fragment?.content.filter(|c| !c.is_empty()) {
                    handler.on_event(&ChatEvent::SummaryDelta(&content));
                    summary.push_str(&content);
                }
            }
            Ok::<(), ChatError>(())
        }
        .await;
        handler.on_event(&ChatEvent::SummaryEnded);

        outcome.map(|()| summary)
    }
}

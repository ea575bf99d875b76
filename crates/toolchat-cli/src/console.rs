//! Console rendering and line input
//!
//! Colors follow one scheme throughout: thinking in blue, answers in white,
//! tool traces in yellow, failures in red, prompts and token usage in green.

use async_trait::async_trait;
use crossterm::QueueableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use std::io::{self, Write};
use std::sync::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use toolchat_core::tool::format_arguments;
use toolchat_core::{ChatEvent, EventHandler, PromptSource};

pub const QUESTION: &str = "What is your next question?";
pub const EMPTY_PROMPT: &str = "The prompt cannot be empty. Please try again.";

/// Renders session events to a terminal
pub struct ConsoleHandler<W: Write + Send> {
    out: Mutex<W>,
    colored: bool,
}

impl ConsoleHandler<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), true)
    }
}

impl<W: Write + Send> ConsoleHandler<W> {
    pub const fn new(out: W, colored: bool) -> Self {
        Self {
            out: Mutex::new(out),
            colored,
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self, color: Option<Color>, text: &str) -> io::Result<()> {
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if self.colored {
            if let Some(color) = color {
                out.queue(SetForegroundColor(color))?;
            }
            out.queue(Print(text))?;
            out.queue(ResetColor)?;
        } else {
            out.write_all(text.as_bytes())?;
        }
        out.flush()
    }

    fn render(&self, event: &ChatEvent<'_>) -> io::Result<()> {
        match event {
            ChatEvent::EmptyPrompt => self.write(Some(Color::Green), &format!("{EMPTY_PROMPT}\n")),
            ChatEvent::PromptAccepted(prompt) => {
                self.write(Some(Color::Green), &format!("Running the prompt: {prompt}\n"))
            }
            ChatEvent::ThinkingStarted => self.write(Some(Color::Blue), "<think>\n"),
            ChatEvent::ThinkingDelta(text) => self.write(Some(Color::Blue), text),
            ChatEvent::ThinkingEnded => self.write(Some(Color::Blue), "\n</think>\n"),
            ChatEvent::ContentDelta(text) => self.write(Some(Color::White), text),
            ChatEvent::ToolCallReceived { name, arguments } => self.write(
                Some(Color::Yellow),
                &format!("{name}: ({})\n", format_arguments(arguments)),
            ),
            ChatEvent::ToolInvoking { name, arguments } => self.write(
                Some(Color::Yellow),
                &format!("{name}: ({}) -> ", format_arguments(arguments)),
            ),
            ChatEvent::ToolSucceeded { output, .. } => {
                self.write(Some(Color::White), &format!("{output}\n"))
            }
            ChatEvent::ToolFailed { message, .. } => {
                self.write(Some(Color::Red), &format!("Failed to invoke tool: {message}\n"))
            }
            ChatEvent::Usage { usage, context_size } => self.write(
                Some(Color::Green),
                &format!(
                    "\n{} / {context_size} tokens used. {} were in the prompt.\n",
                    usage.total(),
                    usage.prompt_tokens
                ),
            ),
            ChatEvent::SummaryStarted => self.write(Some(Color::DarkCyan), "<summary>\n"),
            ChatEvent::SummaryDelta(text) => self.write(Some(Color::DarkCyan), text),
            ChatEvent::SummaryEnded => self.write(Some(Color::DarkCyan), "\n</summary>\n"),
            ChatEvent::TurnComplete => self.write(None, "\n"),
            ChatEvent::RequestFailed(message) => {
                self.write(Some(Color::Red), &format!("{message}\n"))
            }
        }
    }
}

impl<W: Write + Send> EventHandler for ConsoleHandler<W> {
    fn on_event(&self, event: &ChatEvent<'_>) {
        if let Err(e) = self.render(event) {
            tracing::debug!(error = %e, "Console write failed");
        }
    }
}

/// Prompts read line by line from an async reader
pub struct LinePrompts<R> {
    lines: Lines<R>,
    show_question: bool,
}

impl LinePrompts<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            show_question: true,
        }
    }
}

impl<R: AsyncBufRead + Unpin + Send> LinePrompts<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            show_question: false,
        }
    }

    fn ask() -> io::Result<()> {
        let mut out = io::stdout();
        out.queue(SetForegroundColor(Color::Green))?;
        out.queue(Print(format!("{QUESTION}\n")))?;
        out.queue(SetForegroundColor(Color::Cyan))?;
        out.flush()
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> PromptSource for LinePrompts<R> {
    async fn next_prompt(&mut self) -> toolchat_core::Result<Option<String>> {
        if self.show_question {
            Self::ask()?;
        }
        let line = self.lines.next_line().await?;
        if self.show_question {
            let mut out = io::stdout();
            out.queue(ResetColor)?;
            out.flush()?;
        }
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolchat_core::TokenUsage;

    fn render(events: &[ChatEvent<'_>]) -> String {
        let console = ConsoleHandler::new(Vec::new(), false);
        for event in events {
            console.on_event(event);
        }
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn thinking_and_answer() {
        let text = render(&[
            ChatEvent::ThinkingStarted,
            ChatEvent::ThinkingDelta("hmm"),
            ChatEvent::ThinkingEnded,
            ChatEvent::ContentDelta("Hello"),
        ]);
        assert_eq!(text, "<think>\nhmm\n</think>\nHello");
    }

    #[test]
    fn tool_trace_and_failure() {
        let args = json!({"location": "Paris", "unit": "Celsius"});
        let args = args.as_object().unwrap();
        let text = render(&[
            ChatEvent::ToolInvoking {
                name: "GetCurrentTemperature",
                arguments: args,
            },
            ChatEvent::ToolFailed {
                name: "GetCurrentTemperature",
                message: "sensor offline",
            },
        ]);
        assert_eq!(
            text,
            "GetCurrentTemperature: ((location: Paris), (unit: Celsius)) -> Failed to invoke tool: sensor offline\n"
        );
    }

    #[test]
    fn usage_line() {
        let text = render(&[ChatEvent::Usage {
            usage: TokenUsage {
                prompt_tokens: 300,
                generated_tokens: 45,
            },
            context_size: 4096,
        }]);
        assert_eq!(text, "\n345 / 4096 tokens used. 300 were in the prompt.\n");
    }

    #[test]
    fn colored_output_carries_escape_codes() {
        let console = ConsoleHandler::new(Vec::new(), true);
        console.on_event(&ChatEvent::ContentDelta("hi"));
        let bytes = console.into_inner();
        assert!(bytes.starts_with(b"\x1b["));
        assert!(String::from_utf8(bytes).unwrap().contains("hi"));
    }

    #[tokio::test]
    async fn line_prompts_read_until_eof() {
        let mut prompts = LinePrompts::new(&b"first\n\nsecond\n"[..]);
        assert_eq!(prompts.next_prompt().await.unwrap().as_deref(), Some("first"));
        assert_eq!(prompts.next_prompt().await.unwrap().as_deref(), Some(""));
        assert_eq!(prompts.next_prompt().await.unwrap().as_deref(), Some("second"));
        assert_eq!(prompts.next_prompt().await.unwrap(), None);
    }
}

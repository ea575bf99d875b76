//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` over Ollama's HTTP API. Chat responses
//! arrive as newline-delimited JSON and are decoded line by line.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::io::StreamReader;

use toolchat_core::{
    ChatError, ChatRequest, FragmentStream, LlmProvider, Result, provider::ModelInfo,
};

use crate::wire::{ChatBody, TagsResponse, parse_line};

/// Longest NDJSON line accepted from the server
const MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// Ollama provider configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,

    /// Total request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            timeout_secs: 600,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("OLLAMA_HOST")
            .unwrap_or_else(|_| "http://localhost".into());
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(11434);

        Self {
            host,
            port,
            ..Default::default()
        }
    }

    /// `scheme://host:port`, tolerating a trailing slash or an explicit port in `host`
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        let has_scheme = host.contains("://");
        let host = if has_scheme {
            host.to_owned()
        } else {
            format!("http://{host}")
        };

        let authority = host.split_once("://").map_or("", |(_, rest)| rest);
        // an IPv6 literal carries colons of its own; a port can only follow the `]`
        let after_address = authority.rsplit_once(']').map_or(authority, |(_, rest)| rest);
        if after_address.contains(':') {
            host
        } else {
            format!("{host}:{}", self.port)
        }
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create from configuration
    pub fn from_config(config: OllamaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::Config(format!("HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OllamaConfig::from_env())
    }

    /// Create with default localhost settings
    pub fn localhost() -> Result<Self> {
        Self::from_config(OllamaConfig::default())
    }

    pub const fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(ToOwned::to_owned))
            .unwrap_or(body);
        Err(classify_status(status, message))
    }
}

/// Map an HTTP failure status to an error; server-side failures are retryable
fn classify_status(status: reqwest::StatusCode, message: String) -> ChatError {
    let message = format!("HTTP {}: {message}", status.as_u16());
    match status.as_u16() {
        429 => ChatError::RateLimited(message),
        500 | 502 | 503 | 504 => ChatError::ProviderUnavailable(message),
        _ => ChatError::Provider(message),
    }
}

fn transport_error(e: &reqwest::Error) -> ChatError {
    if e.is_connect() {
        ChatError::ProviderUnavailable(e.to_string())
    } else {
        ChatError::Provider(e.to_string())
    }
}

/// Split an NDJSON body into fragments, skipping blank lines
pub fn decode_ndjson<R>(reader: R) -> FragmentStream
where
    R: AsyncRead + Send + 'static,
{
    let lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_BYTES));
    let fragments = lines.filter_map(|line| {
        let item = match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(parse_line(line.trim())),
            Err(LinesCodecError::MaxLineLengthExceeded) => Some(Err(ChatError::Decode(format!(
                "response line longer than {MAX_LINE_BYTES} bytes"
            )))),
            Err(LinesCodecError::Io(e)) => Some(Err(ChatError::Io(e))),
        };
        futures::future::ready(item)
    });
    Box::pin(fragments)
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.get(self.url("/api/tags")).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<FragmentStream> {
        let body = ChatBody::from_request(request);
        tracing::debug!(
            url = %self.url("/api/chat"),
            model = %request.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            stream = body.stream,
            "POST /api/chat"
        );

        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let response = Self::check_status(response).await?;

        let bytes = response.bytes_stream().map_err(std::io::Error::other);
        Ok(decode_ndjson(StreamReader::new(bytes)))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| ChatError::ProviderUnavailable(e.to_string()))?;
        let tags: TagsResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ChatError::Decode(e.to_string()))?;

        Ok(tags
            .models
            .into_iter()
            .map(|m| ModelInfo {
                name: m.name,
                size_bytes: m.size,
                parameter_size: m.details.and_then(|d| d.parameter_size),
            })
            .collect())
    }
}

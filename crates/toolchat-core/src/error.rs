//! Error Types
//!
//! Two families: [`ChatError`] for failures that abort the current request
//! (transport, configuration, I/O), and [`ToolError`] for failures that are
//! reported back to the model as a tool-result turn.

use thiserror::Error;

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors that abort the current operation
#[derive(Error, Debug)]
pub enum ChatError {
    /// LLM provider returned an error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider asked us to slow down
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The response stream could not be decoded
    #[error("Stream decode error: {0}")]
    Decode(String),

    /// Configuration error, detected at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChatError {
    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::RateLimited(_) | Self::Io(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The model server returned an error: {msg}"),
            Self::ProviderUnavailable(_) => {
                "The model server is unavailable. Is `ollama serve` running?".into()
            }
            Self::RateLimited(_) => "The model server is busy. Please wait a moment.".into(),
            Self::Decode(msg) => format!("Could not read the model's response: {msg}"),
            Self::Config(msg) => format!("Configuration problem: {msg}"),
            Self::Io(e) => format!("I/O failure: {e}"),
            Self::Json(e) => format!("Malformed JSON: {e}"),
        }
    }
}

/// Recoverable tool-level failures.
///
/// Every variant is rendered into a tool-result turn so the model can retry
/// with corrected arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The model asked for a tool that is not registered
    #[error("Tool '{0}' is not registered.")]
    NotFound(String),

    /// A required parameter was not supplied
    #[error("Missing parameter {0}")]
    MissingArgument(String),

    /// A supplied value could not be converted to the declared type
    #[error("Parameter '{parameter}' expects {expected}: {reason}")]
    ArgumentCoercion {
        parameter: String,
        expected: String,
        reason: String,
    },

    /// The tool body itself failed
    #[error("{0}")]
    Execution(String),
}

impl ToolError {
    pub fn coercion(
        parameter: impl Into<String>,
        expected: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::ArgumentCoercion {
            parameter: parameter.into(),
            expected: expected.into(),
            reason: reason.to_string(),
        }
    }

    /// Text placed in the tool-result turn for this failure
    pub fn as_tool_result(&self) -> String {
        format!("Failed to invoke: {self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(ChatError::ProviderUnavailable("refused".into()).is_retryable());
        assert!(ChatError::RateLimited("429".into()).is_retryable());
        assert!(!ChatError::Provider("model not found".into()).is_retryable());
        assert!(!ChatError::Config("dup".into()).is_retryable());
    }

    #[test]
    fn execution_message_is_passed_through() {
        let err = ToolError::Execution("disk on fire".into());
        assert_eq!(err.to_string(), "disk on fire");
        assert_eq!(err.as_tool_result(), "Failed to invoke: disk on fire");
    }

    #[test]
    fn missing_argument_names_parameter() {
        let err = ToolError::MissingArgument("location".into());
        assert!(err.to_string().contains("location"));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error type for language model API calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LlmError {
    /// HTTP request failed with a non-success status
    HttpError { status: u16, message: String },
    /// Network/transport error
    NetworkError(String),
    /// JSON serialization/deserialization error
    SerializationError(String),
    /// The API returned a structured error body
    ApiError { kind: String, message: String },
    /// Invalid client configuration
    ConfigError(String),
    /// Credential rejected
    AuthError(String),
    /// Rate limited
    RateLimitError {
        retry_after: Option<u64>,
        message: String,
    },
    /// Request timed out
    TimeoutError(String),
    /// The response carried no text
    EmptyResponse,
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::HttpError { status, message } => {
                write!(f, "HTTP error {status}: {message}")
            }
            LlmError::NetworkError(msg) => write!(f, "Network error: {msg}"),
            LlmError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            LlmError::ApiError { kind, message } => write!(f, "API error {kind}: {message}"),
            LlmError::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            LlmError::AuthError(msg) => write!(f, "Authentication error: {msg}"),
            LlmError::RateLimitError {
                retry_after,
                message,
            } => {
                write!(f, "Rate limit error: {message}")?;
                if let Some(retry_after) = retry_after {
                    write!(f, " (retry after {retry_after} seconds)")?;
                }
                Ok(())
            }
            LlmError::TimeoutError(msg) => write!(f, "Timeout error: {msg}"),
            LlmError::EmptyResponse => write!(f, "Model returned no text"),
        }
    }
}

impl std::error::Error for LlmError {}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::TimeoutError(err.to_string())
        } else {
            LlmError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

/// Result type for language model calls
pub type LlmResult<T> = Result<T, LlmError>;

/// Error body returned by the Messages API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl LlmError {
    /// Map a non-success response to an error, using the structured body
    /// when it parses
    #[must_use]
    pub fn from_response(status: u16, retry_after: Option<u64>, body: &str) -> Self {
        let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
        let message = parsed
            .as_ref()
            .map_or_else(|| body.trim().to_string(), |b| b.error.message.clone());

        match status {
            401 | 403 => LlmError::AuthError(message),
            429 => LlmError::RateLimitError {
                retry_after,
                message,
            },
            _ => match parsed {
                Some(b) => LlmError::ApiError {
                    kind: b.error.kind,
                    message: b.error.message,
                },
                None => LlmError::HttpError { status, message },
            },
        }
    }
}

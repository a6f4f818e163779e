//! Error types shared by every provider client and the orchestrator

use std::time::Duration;
use thiserror::Error;

/// Result alias using the core error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while talking to providers or validating input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// DNS, connection, or socket failure before a response was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success status or an explicit error payload
    #[error("Provider error (status {status:?}): {message}")]
    Provider {
        status: Option<u16>,
        message: String,
    },

    /// Provider response could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Caller supplied malformed input (missing audio, bad history JSON)
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Provider error with an HTTP status
    pub fn provider(status: u16, message: impl Into<String>) -> Self {
        Error::Provider {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Provider error reported inside a successful response body
    pub fn provider_payload(message: impl Into<String>) -> Self {
        Error::Provider {
            status: None,
            message: message.into(),
        }
    }

    /// Whether the failure was caused by the caller's input
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Whether the failure happened before any provider response arrived
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_) | Error::Cancelled)
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Transport(_) => "transport",
            Error::Provider { .. } => "provider",
            Error::Decode(_) => "decode",
            Error::Validation(_) => "validation",
            Error::Timeout(_) => "timeout",
            Error::Cancelled => "cancelled",
            Error::Configuration(_) => "configuration",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

//! Chat-completion integration
//!
//! Features:
//! - OpenAI-compatible and Ollama backends
//! - Adapter exposing a backend as the core `CompletionClient`
//! - Tutor, suggestion, and feedback prompts

pub mod adapter;
pub mod backend;
pub mod factory;
pub mod prompt;

pub use adapter::CompletionAdapter;
pub use backend::{
    FinishReason, GenerationResult, LlmBackend, LlmConfig, OllamaBackend, OpenAIBackend,
    OpenAIConfig,
};
pub use factory::{create_backend, create_completion_client};
pub use prompt::{
    extract_suggestion, feedback_request, suggestion_request, tutor_prompt, Message, Role,
    FEEDBACK_SYSTEM_PROMPT, SUGGESTION_SYSTEM_PROMPT,
};

use std::time::Duration;
use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Classify a failed `send()`; reqwest does not carry the configured
    /// timeout, so the caller passes it in.
    pub(crate) fn from_send(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(timeout)
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for voice_tutor_core::Error {
    fn from(err: LlmError) -> Self {
        use voice_tutor_core::Error;
        match err {
            LlmError::Api { status, message } => Error::provider(status, message),
            LlmError::Network(msg) => Error::Transport(msg),
            LlmError::InvalidResponse(msg) => Error::Decode(msg),
            LlmError::Timeout(after) => Error::Timeout(after),
            LlmError::Configuration(msg) => Error::Configuration(msg),
        }
    }
}

//! Voice Tutor Server
//!
//! HTTP endpoints that run conversation turns through the pipeline.

pub mod conversation;
pub mod http;
pub mod metrics;
pub mod speaker;
pub mod state;
pub mod store;

pub use http::create_router;
pub use metrics::{
    init_metrics, record_error, record_llm_latency, record_request, record_stt_latency,
    record_total_latency, record_tts_latency,
};
pub use speaker::{HeaderSpeakerResolver, SpeakerResolver};
pub use state::AppState;
pub use store::{ConversationStore, InMemoryConversationStore, StoredConversation};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use voice_tutor_core::ResponseEnvelope;
use voice_tutor_pipeline::PipelineError;

/// Server errors
///
/// Clients only ever see [`ServerError::public_message`]; the wrapped
/// details go to the log.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Malformed request; the message is safe to return as is
    #[error("Invalid request: {0}")]
    InvalidRequest(&'static str),

    /// Nothing stored for the caller; the message is safe to return as is
    #[error("Not found: {0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Pipeline(err) if err.is_validation() => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_)
            | ServerError::Persistence(_)
            | ServerError::Configuration(_)
            | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client
    pub fn public_message(&self) -> &'static str {
        match self {
            ServerError::InvalidRequest(msg) | ServerError::NotFound(msg) => *msg,
            ServerError::Pipeline(PipelineError::Transcription(_)) => "Transcription failed",
            ServerError::Pipeline(PipelineError::Reply(_)) => "LLM request failed",
            ServerError::Pipeline(PipelineError::Feedback(_)) => "Feedback generation failed",
            ServerError::Persistence(_) => "Failed to save conversation",
            ServerError::Configuration(_) | ServerError::Internal(_) => "Internal server error",
        }
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        err.status_code()
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }
        (status, Json(ResponseEnvelope::error(self.public_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_tutor_core::Error;

    #[test]
    fn test_pipeline_error_mapping() {
        let err = ServerError::from(PipelineError::Transcription(Error::Transport(
            "connection refused".into(),
        )));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Transcription failed");

        let err = ServerError::from(PipelineError::Transcription(Error::Validation(
            "audio is empty".into(),
        )));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ServerError::from(PipelineError::Reply(Error::provider(502, "bad gateway")));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "LLM request failed");
    }

    #[test]
    fn test_public_message_hides_details() {
        let err = ServerError::Persistence("duplicate key value violates constraint".into());
        assert_eq!(err.public_message(), "Failed to save conversation");
        assert_eq!(
            ServerError::InvalidRequest("Invalid history format").public_message(),
            "Invalid history format"
        );

        let err = ServerError::NotFound("No conversation found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "No conversation found");
    }
}

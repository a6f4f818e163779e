//! Conversation pipeline
//!
//! This crate provides the per-turn processing pipeline:
//! - Speech-to-text providers (self-hosted Whisper, cloud)
//! - Text-to-speech providers (self-hosted KittenTTS, cloud)
//! - A fan-out primitive running completions under a budget and a
//!   cancellation token
//! - The conversation orchestrator tying them together

pub mod fanout;
mod http;
pub mod orchestrator;
pub mod stt;
pub mod tts;

// STT exports
pub use stt::{create_stt, CloudStt, SelfHostedStt};

// TTS exports
pub use tts::{create_tts, voice_params, CloudTts, SelfHostedTts};

// Orchestrator exports
pub use fanout::{fan_out, guarded, FanOutTask};
pub use orchestrator::{
    ConversationOrchestrator, OrchestratorConfig, PipelineStage, StageTimings, TurnOutcome,
    TurnRequest, TTS_FAILED, TTS_UNAVAILABLE,
};

use thiserror::Error;
use voice_tutor_core::Error;

/// Pipeline errors
///
/// Each variant names the stage whose failure ended the turn and wraps the
/// provider error that caused it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Transcription failed: {0}")]
    Transcription(Error),

    #[error("Reply generation failed: {0}")]
    Reply(Error),

    #[error("Feedback generation failed: {0}")]
    Feedback(Error),
}

impl PipelineError {
    /// Underlying provider error
    pub fn source_error(&self) -> &Error {
        match self {
            PipelineError::Transcription(e) | PipelineError::Reply(e) | PipelineError::Feedback(e) => e,
        }
    }

    /// Stage at which the turn stopped
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Transcription(_) => PipelineStage::Transcribing,
            PipelineError::Reply(_) | PipelineError::Feedback(_) => {
                PipelineStage::AwaitingCompletion
            }
        }
    }

    /// Whether the caller's input caused the failure
    pub fn is_validation(&self) -> bool {
        self.source_error().is_validation()
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.source_error(), Error::Cancelled)
    }
}

impl From<PipelineError> for Error {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Transcription(e) | PipelineError::Reply(e) | PipelineError::Feedback(e) => e,
        }
    }
}

//! Response envelope
//!
//! One envelope is produced per orchestrated turn. Construction goes through
//! [`ResponseEnvelope::assemble`] and [`ResponseEnvelope::error`] so that a
//! `success` envelope always carries audio and a `partial_success` envelope
//! never does.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;

use crate::{ConversationTurn, SynthesisResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    Success,
    PartialSuccess,
    Error,
}

impl EnvelopeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeStatus::Success => "success",
            EnvelopeStatus::PartialSuccess => "partial_success",
            EnvelopeStatus::Error => "error",
        }
    }
}

/// Text outputs of a completed turn
#[derive(Debug, Clone, Default)]
pub struct EnvelopeParts {
    pub transcribed_text: String,
    pub reply: String,
    pub suggestion: String,
    pub speaker_name: String,
    pub history: Vec<ConversationTurn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    status: EnvelopeStatus,
    transcribed_text: String,
    llm_response: String,
    audio_base64: String,
    history: Vec<ConversationTurn>,
    suggestion: String,
    user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ResponseEnvelope {
    /// Build the envelope for a turn whose text parts succeeded.
    ///
    /// Audio yields `success`; a failed synthesis yields `partial_success`
    /// with the failure message.
    pub fn assemble(parts: EnvelopeParts, speech: &SynthesisResult) -> Self {
        let (status, audio_base64, error) = match speech.audio_bytes() {
            Some(bytes) => (EnvelopeStatus::Success, BASE64.encode(bytes), None),
            None => (
                EnvelopeStatus::PartialSuccess,
                String::new(),
                Some(speech.error().unwrap_or("speech unavailable").to_string()),
            ),
        };

        Self {
            status,
            transcribed_text: parts.transcribed_text,
            llm_response: parts.reply,
            audio_base64,
            history: parts.history,
            suggestion: parts.suggestion,
            user_name: parts.speaker_name,
            error,
        }
    }

    /// Envelope for a request that failed before a turn could be completed
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            transcribed_text: String::new(),
            llm_response: String::new(),
            audio_base64: String::new(),
            history: Vec::new(),
            suggestion: String::new(),
            user_name: String::new(),
            error: Some(message.into()),
        }
    }

    pub fn status(&self) -> EnvelopeStatus {
        self.status
    }

    pub fn transcribed_text(&self) -> &str {
        &self.transcribed_text
    }

    pub fn reply(&self) -> &str {
        &self.llm_response
    }

    pub fn audio_base64(&self) -> &str {
        &self.audio_base64
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn suggestion(&self) -> &str {
        &self.suggestion
    }

    pub fn speaker_name(&self) -> &str {
        &self.user_name
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

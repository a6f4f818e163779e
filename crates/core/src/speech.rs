//! Speech request and result types

use serde::{Deserialize, Serialize};

/// Output of a transcription provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Recognized text
    pub text: String,
    /// Language reported by the provider (may be empty)
    #[serde(default)]
    pub language: String,
}

impl TranscriptionResult {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
        }
    }
}

/// Logical synthesis request fields shared by every TTS provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceParams {
    pub model: String,
    pub voice: String,
    pub response_format: String,
    pub speed: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            model: "kitten-tts".to_string(),
            voice: "expr-voice-2-f".to_string(),
            response_format: "mp3".to_string(),
            speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SynthesisOutcome {
    Audio(Vec<u8>),
    Failed(String),
}

/// Outcome of a synthesis call that reached the provider.
///
/// Holds either non-empty audio or a provider-reported error, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisResult(SynthesisOutcome);

impl SynthesisResult {
    /// Audio returned by the provider. Empty audio is recorded as a failure.
    pub fn audio(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            return Self::failed("provider returned empty audio");
        }
        Self(SynthesisOutcome::Audio(bytes))
    }

    /// Provider responded but signaled a failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self(SynthesisOutcome::Failed(message.into()))
    }

    pub fn audio_bytes(&self) -> Option<&[u8]> {
        match &self.0 {
            SynthesisOutcome::Audio(bytes) => Some(bytes),
            SynthesisOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.0 {
            SynthesisOutcome::Audio(_) => None,
            SynthesisOutcome::Failed(msg) => Some(msg),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.0, SynthesisOutcome::Audio(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_audio_is_failure() {
        let result = SynthesisResult::audio(Vec::new());
        assert!(!result.is_success());
        assert!(result.audio_bytes().is_none());
        assert!(result.error().is_some());
    }

    #[test]
    fn test_audio_and_error_exclusive() {
        let ok = SynthesisResult::audio(vec![1, 2, 3]);
        assert_eq!(ok.audio_bytes(), Some(&[1u8, 2, 3][..]));
        assert_eq!(ok.error(), None);

        let failed = SynthesisResult::failed("HTTP 503");
        assert_eq!(failed.error(), Some("HTTP 503"));
        assert_eq!(failed.audio_bytes(), None);
    }
}

//! Speech processing traits

use crate::{Result, SynthesisResult, TranscriptionResult, VoiceParams};
use async_trait::async_trait;

/// Speech-to-Text interface
///
/// Implementations:
/// - `SelfHostedStt` - whisper container exposing a multipart endpoint
/// - `CloudStt` - OpenAI-compatible transcription API with bearer auth
///
/// # Example
///
/// ```ignore
/// let stt: Arc<dyn SpeechToText> = create_stt(&config.asr)?;
/// let transcript = stt.transcribe(&audio, "recording.mp3").await?;
/// println!("Transcribed: {}", transcript.text);
/// ```
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// Transcribe one complete recording
    ///
    /// # Arguments
    /// * `audio` - Encoded audio file contents
    /// * `file_name` - Name forwarded to the provider (used for format sniffing)
    ///
    /// # Returns
    /// Transcript text and the language reported by the provider
    async fn transcribe(&self, audio: &[u8], file_name: &str) -> Result<TranscriptionResult>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;
}

/// Text-to-Speech interface
///
/// Two failure channels are kept apart: `Err` means the provider could not be
/// reached, while `Ok(SynthesisResult::failed(..))` means it answered with a
/// non-success status or a non-audio body.
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    /// Synthesize text to encoded audio
    async fn synthesize(&self, text: &str, params: &VoiceParams) -> Result<SynthesisResult>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;
}

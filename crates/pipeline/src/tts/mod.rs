//! Text-to-Speech providers
//!
//! A provider that answered but could not produce audio returns
//! `Ok(SynthesisResult::failed(..))`. Only transport failures are `Err`.

mod cloud;
mod self_hosted;

pub use cloud::CloudTts;
pub use self_hosted::SelfHostedTts;

use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;

use voice_tutor_config::{TtsConfig, TtsProvider};
use voice_tutor_core::{Error, Result, SynthesisResult, TextToSpeech, VoiceParams};

use crate::http::truncate;

/// Create the synthesis client named by `config.provider`
pub fn create_tts(config: &TtsConfig) -> Result<Arc<dyn TextToSpeech>> {
    let tts: Arc<dyn TextToSpeech> = match config.provider {
        TtsProvider::SelfHosted => Arc::new(SelfHostedTts::new(config)?),
        TtsProvider::Cloud => Arc::new(CloudTts::new(config)?),
    };
    tracing::info!(
        provider = tts.provider_name(),
        base_url = %config.base_url,
        voice = %config.voice,
        "Speech synthesis client ready"
    );
    Ok(tts)
}

/// Voice parameters sent with every synthesis request
pub fn voice_params(config: &TtsConfig) -> VoiceParams {
    VoiceParams {
        model: config.model.clone(),
        voice: config.voice.clone(),
        response_format: config.response_format.clone(),
        speed: config.speed,
    }
}

/// Turn a provider response into a synthesis result.
///
/// Non-success statuses and JSON or text bodies are provider-reported
/// failures; anything else is audio.
async fn read_audio(response: reqwest::Response) -> Result<SynthesisResult> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Ok(SynthesisResult::failed(format!(
            "HTTP {}: {}",
            status.as_u16(),
            truncate(body.trim())
        )));
    }

    if content_type.starts_with("application/json") || content_type.starts_with("text/") {
        let body = response.text().await.unwrap_or_default();
        return Ok(SynthesisResult::failed(format!(
            "unexpected {} response: {}",
            content_type,
            truncate(body.trim())
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Transport(format!("Failed to read audio body: {}", e)))?;
    Ok(SynthesisResult::audio(bytes.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_params_from_config() {
        let config = TtsConfig {
            voice: "alloy".into(),
            speed: 1.5,
            ..Default::default()
        };
        let params = voice_params(&config);
        assert_eq!(params.voice, "alloy");
        assert_eq!(params.speed, 1.5);
        assert_eq!(params.response_format, "mp3");
    }

    #[test]
    fn test_cloud_requires_key() {
        let config = TtsConfig {
            provider: TtsProvider::Cloud,
            ..Default::default()
        };
        assert!(matches!(create_tts(&config), Err(Error::Configuration(_))));
    }
}

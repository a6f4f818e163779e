//! Speech-to-Text providers
//!
//! The provider is chosen once from `AsrConfig` and shared as
//! `Arc<dyn SpeechToText>`.

mod cloud;
mod self_hosted;

pub use cloud::CloudStt;
pub use self_hosted::SelfHostedStt;

use serde::Deserialize;
use std::sync::Arc;

use voice_tutor_config::{AsrConfig, AsrProvider};
use voice_tutor_core::{Result, SpeechToText};

/// Create the transcription client named by `config.provider`
pub fn create_stt(config: &AsrConfig) -> Result<Arc<dyn SpeechToText>> {
    let stt: Arc<dyn SpeechToText> = match config.provider {
        AsrProvider::SelfHosted => Arc::new(SelfHostedStt::new(config)?),
        AsrProvider::Cloud => Arc::new(CloudStt::new(config)?),
    };
    tracing::info!(
        provider = stt.provider_name(),
        url = %config.url,
        "Transcription client ready"
    );
    Ok(stt)
}

/// JSON body returned by both providers
#[derive(Debug, Deserialize)]
struct TranscriptionBody {
    #[serde(default)]
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

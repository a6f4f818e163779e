//! Self-hosted KittenTTS server (`{base}/v1/audio/speech`)

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::{Duration, Instant};

use voice_tutor_config::TtsConfig;
use voice_tutor_core::{Result, SynthesisResult, TextToSpeech, VoiceParams};

use super::read_audio;
use crate::http::{api_key, build_client, send_error};

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
    speed: f32,
}

pub struct SelfHostedTts {
    client: Client,
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl SelfHostedTts {
    pub fn new(config: &TtsConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);
        Ok(Self {
            client: build_client(timeout)?,
            url: format!("{}/v1/audio/speech", config.base_url.trim_end_matches('/')),
            api_key: api_key(&config.api_key),
            timeout,
        })
    }
}

#[async_trait]
impl TextToSpeech for SelfHostedTts {
    async fn synthesize(&self, text: &str, params: &VoiceParams) -> Result<SynthesisResult> {
        let start = Instant::now();

        let request = SpeechRequest {
            model: &params.model,
            input: text,
            voice: &params.voice,
            response_format: &params.response_format,
            speed: params.speed,
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout))?;
        let result = read_audio(response).await?;

        tracing::debug!(
            provider = self.provider_name(),
            chars = text.chars().count(),
            ok = result.is_success(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Synthesis finished"
        );
        Ok(result)
    }

    fn provider_name(&self) -> &str {
        "self_hosted"
    }
}

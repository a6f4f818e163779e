//! Groq speech API (`{base}/openai/v1/audio/speech`)
//!
//! Same request shape as the self-hosted server minus `speed`, which the
//! cloud API rejects.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use voice_tutor_config::TtsConfig;
use voice_tutor_core::{Error, Result, SynthesisResult, TextToSpeech, VoiceParams};

use super::read_audio;
use crate::http::{api_key, build_client, send_error};

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

pub struct CloudTts {
    client: Client,
    url: String,
    api_key: String,
    timeout: Duration,
}

impl CloudTts {
    pub fn new(config: &TtsConfig) -> Result<Self> {
        let key = api_key(&config.api_key).ok_or_else(|| {
            Error::Configuration("tts.api_key is required for the cloud provider".to_string())
        })?;

        let timeout = Duration::from_millis(config.timeout_ms);
        Ok(Self {
            client: build_client(timeout)?,
            url: format!(
                "{}/openai/v1/audio/speech",
                config.base_url.trim_end_matches('/')
            ),
            api_key: key,
            timeout,
        })
    }
}

#[async_trait]
impl TextToSpeech for CloudTts {
    async fn synthesize(&self, text: &str, params: &VoiceParams) -> Result<SynthesisResult> {
        let request = SpeechRequest {
            model: &params.model,
            input: text,
            voice: &params.voice,
            response_format: &params.response_format,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout))?;

        read_audio(response).await
    }

    fn provider_name(&self) -> &str {
        "cloud"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header, HeaderMap},
        routing::post,
        Json, Router,
    };
    use serde_json::Value;
    use voice_tutor_config::TtsProvider;

    #[tokio::test]
    async fn test_request_has_no_speed() {
        let router = Router::new().route(
            "/openai/v1/audio/speech",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert!(body.get("speed").is_none());
                assert_eq!(body["model"], "playai-tts");
                assert_eq!(
                    headers.get("authorization").unwrap().to_str().unwrap(),
                    "Bearer gsk-test"
                );
                ([(header::CONTENT_TYPE, "audio/wav")], vec![1u8, 2, 3])
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let tts = CloudTts::new(&TtsConfig {
            provider: TtsProvider::Cloud,
            base_url: format!("http://{}/", addr),
            api_key: Some("gsk-test".into()),
            ..Default::default()
        })
        .unwrap();

        let params = VoiceParams {
            model: "playai-tts".into(),
            voice: "Fritz-PlayAI".into(),
            response_format: "wav".into(),
            speed: 2.0,
        };
        let result = tts.synthesize("Hi", &params).await.unwrap();
        assert_eq!(result.audio_bytes(), Some(&[1u8, 2, 3][..]));
    }
}

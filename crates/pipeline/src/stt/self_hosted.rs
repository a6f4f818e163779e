//! Self-hosted Whisper ASR container
//!
//! `POST {url}?encode=true&task=..&language=..&output=json` with the audio
//! in the multipart field `audio_file`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::{Duration, Instant};

use voice_tutor_config::AsrConfig;
use voice_tutor_core::{Error, Result, SpeechToText, TranscriptionResult};

use super::TranscriptionBody;
use crate::http::{build_client, send_error, status_error};

pub struct SelfHostedStt {
    client: Client,
    url: String,
    language: String,
    task: String,
    output: String,
    timeout: Duration,
}

impl SelfHostedStt {
    pub fn new(config: &AsrConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);
        Ok(Self {
            client: build_client(timeout)?,
            url: config.url.clone(),
            language: config.language.clone(),
            task: config.task.clone(),
            output: config.output.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl SpeechToText for SelfHostedStt {
    async fn transcribe(&self, audio: &[u8], file_name: &str) -> Result<TranscriptionResult> {
        let start = Instant::now();

        let form = Form::new().part(
            "audio_file",
            Part::bytes(audio.to_vec()).file_name(file_name.to_string()),
        );

        let response = self
            .client
            .post(&self.url)
            .query(&[
                ("encode", "true"),
                ("task", self.task.as_str()),
                ("language", self.language.as_str()),
                ("output", self.output.as_str()),
            ])
            .multipart(form)
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: TranscriptionBody = response
            .json()
            .await
            .map_err(|e| Error::Decode(format!("Failed to parse ASR response: {}", e)))?;

        if let Some(error) = body.error.filter(|e| !e.is_empty()) {
            return Err(Error::provider_payload(error));
        }

        tracing::debug!(
            provider = self.provider_name(),
            bytes = audio.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Transcription received"
        );

        Ok(TranscriptionResult::new(
            body.text,
            body.language.unwrap_or_default(),
        ))
    }

    fn provider_name(&self) -> &str {
        "self_hosted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Multipart, Query},
        http::StatusCode,
        routing::post,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config(url: String) -> AsrConfig {
        AsrConfig {
            url,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_transcribe_wire_format() {
        let router = Router::new().route(
            "/asr",
            post(
                |Query(query): Query<HashMap<String, String>>, mut multipart: Multipart| async move {
                    assert_eq!(query.get("encode").map(String::as_str), Some("true"));
                    assert_eq!(query.get("task").map(String::as_str), Some("transcribe"));
                    assert_eq!(query.get("language").map(String::as_str), Some("en"));
                    assert_eq!(query.get("output").map(String::as_str), Some("json"));

                    let field = multipart.next_field().await.unwrap().unwrap();
                    assert_eq!(field.name(), Some("audio_file"));
                    assert_eq!(field.file_name(), Some("recording.mp3"));
                    let bytes = field.bytes().await.unwrap();
                    Json(json!({"text": format!("{} bytes", bytes.len()), "language": "en"}))
                },
            ),
        );
        let base = spawn(router).await;

        let stt = SelfHostedStt::new(&config(format!("{}/asr", base))).unwrap();
        let result = stt.transcribe(&[1, 2, 3, 4], "recording.mp3").await.unwrap();
        assert_eq!(result.text, "4 bytes");
        assert_eq!(result.language, "en");
    }

    #[tokio::test]
    async fn test_error_payload_is_provider_error() {
        let router = Router::new().route(
            "/asr",
            post(|| async { Json(json!({"text": "", "error": "model not loaded"})) }),
        );
        let base = spawn(router).await;

        let stt = SelfHostedStt::new(&config(format!("{}/asr", base))).unwrap();
        let err = stt.transcribe(b"abc", "a.webm").await.unwrap_err();
        assert_eq!(err, Error::provider_payload("model not loaded"));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let router = Router::new().route(
            "/asr",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "warming up") }),
        );
        let base = spawn(router).await;

        let stt = SelfHostedStt::new(&config(format!("{}/asr", base))).unwrap();
        let err = stt.transcribe(b"abc", "a.webm").await.unwrap_err();
        assert_eq!(err, Error::provider(503, "warming up"));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let router = Router::new().route("/asr", post(|| async { "not json" }));
        let base = spawn(router).await;

        let stt = SelfHostedStt::new(&config(format!("{}/asr", base))).unwrap();
        let err = stt.transcribe(b"abc", "a.webm").await.unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[tokio::test]
    async fn test_unreachable_is_transport() {
        let stt = SelfHostedStt::new(&config("http://127.0.0.1:1/asr".into())).unwrap();
        let err = stt.transcribe(b"abc", "a.webm").await.unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn test_silence_body() {
        // Silence still produces a JSON body, with empty text and no language
        let body: TranscriptionBody = serde_json::from_value(json!({"text": ""})).unwrap();
        assert!(body.text.is_empty());
        assert!(body.language.is_none());
        assert!(body.error.is_none());
    }
}

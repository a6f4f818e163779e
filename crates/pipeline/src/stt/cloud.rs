//! OpenAI-compatible transcription API (Groq and similar)

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::{Duration, Instant};

use voice_tutor_config::AsrConfig;
use voice_tutor_core::{Error, Result, SpeechToText, TranscriptionResult};

use super::TranscriptionBody;
use crate::http::{api_key, build_client, send_error, status_error};

pub struct CloudStt {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    /// `None` lets the provider detect the language
    language: Option<String>,
    timeout: Duration,
}

impl CloudStt {
    /// Fails when the model or API key is missing
    pub fn new(config: &AsrConfig) -> Result<Self> {
        let key = api_key(&config.api_key).ok_or_else(|| {
            Error::Configuration("asr.api_key is required for the cloud provider".to_string())
        })?;
        if config.model.trim().is_empty() {
            return Err(Error::Configuration(
                "asr.model is required for the cloud provider".to_string(),
            ));
        }

        let language = match config.language.trim() {
            "" | "auto" => None,
            lang => Some(lang.to_string()),
        };

        let timeout = Duration::from_millis(config.timeout_ms);
        Ok(Self {
            client: build_client(timeout)?,
            url: config.url.clone(),
            api_key: key,
            model: config.model.clone(),
            language,
            timeout,
        })
    }

    fn form(&self, audio: &[u8], file_name: &str) -> Form {
        let mut form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json");
        if let Some(ref language) = self.language {
            form = form.text("language", language.clone());
        }
        form.part(
            "file",
            Part::bytes(audio.to_vec()).file_name(file_name.to_string()),
        )
    }
}

#[async_trait]
impl SpeechToText for CloudStt {
    async fn transcribe(&self, audio: &[u8], file_name: &str) -> Result<TranscriptionResult> {
        let start = Instant::now();

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .multipart(self.form(audio, file_name))
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
            model = %self.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Transcription received"
        );

        let language = body
            .language
            .or_else(|| self.language.clone())
            .unwrap_or_default();
        Ok(TranscriptionResult::new(body.text, language))
    }

    fn provider_name(&self) -> &str {
        "cloud"
    }
}

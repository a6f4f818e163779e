//! LLM Factory
//!
//! Selects the backend once from `LlmSettings` and hands out a shared
//! `CompletionClient`.
//!
//! ## Example
//! ```ignore
//! let client = create_completion_client(&settings.llm)?;
//! let reply = client.complete(&tutor_prompt(2), &history, "Hi!").await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use voice_tutor_config::{LlmProvider, LlmSettings};
use voice_tutor_core::CompletionClient;

use crate::{
    adapter::CompletionAdapter,
    backend::{LlmBackend, LlmConfig, OllamaBackend, OpenAIBackend, OpenAIConfig},
    LlmError,
};

/// Create the backend named by `settings.provider`
pub fn create_backend(settings: &LlmSettings) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let timeout = Duration::from_millis(settings.timeout_ms);

    match settings.provider {
        LlmProvider::OpenAI => {
            let config = OpenAIConfig {
                endpoint: settings.endpoint.clone(),
                api_key: settings.api_key.clone().unwrap_or_default(),
                model: settings.model.clone(),
                max_tokens: settings.max_tokens,
                temperature: settings.temperature,
                timeout,
            };
            Ok(Arc::new(OpenAIBackend::new(config)?))
        }
        LlmProvider::Ollama => {
            let config = LlmConfig {
                model: settings.model.clone(),
                endpoint: settings.endpoint.clone(),
                max_tokens: settings.max_tokens,
                temperature: settings.temperature,
                timeout,
                ..Default::default()
            };
            Ok(Arc::new(OllamaBackend::new(config)?))
        }
    }
}

/// Create the completion client used by the orchestrator
pub fn create_completion_client(
    settings: &LlmSettings,
) -> Result<Arc<dyn CompletionClient>, LlmError> {
    let backend = create_backend(settings)?;
    tracing::info!(
        provider = ?settings.provider,
        model = %backend.model_name(),
        endpoint = %settings.endpoint,
        "Completion backend ready"
    );
    Ok(Arc::new(CompletionAdapter::from_arc(backend)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_requires_key_for_remote() {
        let settings = LlmSettings::default();
        assert!(matches!(
            create_completion_client(&settings),
            Err(LlmError::Configuration(_))
        ));

        let settings = LlmSettings {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let client = create_completion_client(&settings).unwrap();
        assert_eq!(client.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let settings = LlmSettings {
            provider: LlmProvider::Ollama,
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            ..Default::default()
        };
        let client = create_completion_client(&settings).unwrap();
        assert_eq!(client.model_name(), "llama3.2");
    }
}

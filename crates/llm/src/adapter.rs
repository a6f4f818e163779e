//! Completion client adapter
//!
//! Bridges the `LlmBackend` trait to the core `CompletionClient` trait so the
//! orchestrator never sees backend-specific types.

use async_trait::async_trait;
use std::sync::Arc;

use voice_tutor_core::{CompletionClient, ConversationTurn, Result};

use crate::backend::{FinishReason, LlmBackend};
use crate::prompt::build_messages;

/// Adapter that wraps an LlmBackend to implement `CompletionClient`.
///
/// # Example
///
/// ```ignore
/// let backend = OllamaBackend::new(config)?;
/// let client: Arc<dyn CompletionClient> = Arc::new(CompletionAdapter::new(backend));
/// ```
pub struct CompletionAdapter {
    backend: Arc<dyn LlmBackend>,
    model_name: String,
}

impl CompletionAdapter {
    /// Create a new adapter wrapping an LlmBackend
    pub fn new<B: LlmBackend + 'static>(backend: B) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    /// Create from an Arc'd backend
    pub fn from_arc(backend: Arc<dyn LlmBackend>) -> Self {
        let model_name = backend.model_name().to_string();
        Self {
            backend,
            model_name,
        }
    }
}

#[async_trait]
impl CompletionClient for CompletionAdapter {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ConversationTurn],
        latest_user_text: &str,
    ) -> Result<String> {
        let messages = build_messages(system_prompt, history, latest_user_text);

        let result = self.backend.generate(&messages).await?;

        if result.finish_reason == FinishReason::Length {
            tracing::debug!(
                model = %self.model_name,
                tokens = result.tokens,
                "Completion truncated by max_tokens"
            );
        }
        tracing::debug!(
            model = %self.model_name,
            tokens = result.tokens,
            elapsed_ms = result.total_time_ms,
            "Completion finished"
        );

        Ok(result.text)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

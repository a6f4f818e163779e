//! Completion trait

use crate::{ConversationTurn, Result};
use async_trait::async_trait;

/// Chat-completion interface
///
/// The same contract serves the suggestion, reply, and feedback call sites;
/// they differ only in system prompt and post-processing.
#[async_trait]
pub trait CompletionClient: Send + Sync + 'static {
    /// Generate assistant text
    ///
    /// # Arguments
    /// * `system_prompt` - Instructions sent as the system message
    /// * `history` - Prior turns, sent in order as user/assistant messages
    /// * `latest_user_text` - Final user message
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ConversationTurn],
        latest_user_text: &str,
    ) -> Result<String>;

    /// Model name for logging
    fn model_name(&self) -> &str;
}

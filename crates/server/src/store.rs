//! Finished-conversation storage
//!
//! The orchestrator never touches storage. The end-of-conversation endpoint
//! hands the final history here; the feedback endpoint reads it back when
//! the client sends none.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;

use voice_tutor_core::ConversationTurn;

use crate::ServerError;

/// A saved conversation
#[derive(Debug, Clone, Serialize)]
pub struct StoredConversation {
    pub speaker: String,
    pub history: Vec<ConversationTurn>,
    pub saved_at: DateTime<Utc>,
}

/// Conversation store trait
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Save a finished conversation for `speaker`
    async fn save(&self, speaker: &str, history: Vec<ConversationTurn>) -> Result<(), ServerError>;

    /// Every saved conversation for `speaker`, oldest first
    async fn load(&self, speaker: &str) -> Result<Vec<StoredConversation>, ServerError>;

    /// Most recently saved conversation for `speaker`
    async fn latest(&self, speaker: &str) -> Result<Option<StoredConversation>, ServerError> {
        Ok(self.load(speaker).await?.pop())
    }

    /// Whether conversations survive a restart
    fn is_durable(&self) -> bool {
        false
    }
}

/// Process-local store
#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<String, Vec<StoredConversation>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saved conversations across all speakers
    pub fn count(&self) -> usize {
        self.conversations.read().values().map(Vec::len).sum()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn save(&self, speaker: &str, history: Vec<ConversationTurn>) -> Result<(), ServerError> {
        let turns = history.len();
        self.conversations
            .write()
            .entry(speaker.to_string())
            .or_default()
            .push(StoredConversation {
                speaker: speaker.to_string(),
                history,
                saved_at: Utc::now(),
            });
        tracing::debug!(speaker, turns, "Conversation saved");
        Ok(())
    }

    async fn load(&self, speaker: &str) -> Result<Vec<StoredConversation>, ServerError> {
        Ok(self
            .conversations
            .read()
            .get(speaker)
            .cloned()
            .unwrap_or_default())
    }
}

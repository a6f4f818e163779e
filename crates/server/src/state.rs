//! Application State
//!
//! Shared state across all handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use voice_tutor_config::Settings;
use voice_tutor_pipeline::ConversationOrchestrator;

use crate::speaker::{HeaderSpeakerResolver, SpeakerResolver};
use crate::store::{ConversationStore, InMemoryConversationStore};
use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub orchestrator: Arc<ConversationOrchestrator>,
    pub speakers: Arc<dyn SpeakerResolver>,
    pub store: Arc<dyn ConversationStore>,
    /// Present when the Prometheus recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// State with the header speaker resolver and an in-memory store
    pub fn new(config: Settings, orchestrator: ConversationOrchestrator) -> Result<Self, ServerError> {
        let speakers = HeaderSpeakerResolver::new(&config.server.speaker_header)?;
        Ok(Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            speakers: Arc::new(speakers),
            store: Arc::new(InMemoryConversationStore::new()),
            metrics: None,
        })
    }

    /// Build every provider client named in `config`
    pub fn from_settings(config: Settings) -> Result<Self, ServerError> {
        let orchestrator = ConversationOrchestrator::from_settings(&config)
            .map_err(|e| ServerError::Configuration(e.to_string()))?;
        Self::new(config, orchestrator)
    }

    pub fn with_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }
}

//! Configuration management for the voice tutor
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default`, `config/{env}`)
//! - Environment variables (`VOICE_TUTOR__SECTION__KEY`)
//! - The flat provider keys used by existing deployments
//!   (`ASR_PROVIDER`, `OPENAI_BASE_URL`, `TTS_VOICE`, ...)
//!
//! Only the binary reads the process environment. Provider clients receive
//! the typed sections below through their constructors.

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, load_settings_from, AsrConfig, AsrProvider, ConversationConfig, LlmProvider,
    LlmSettings, ObservabilityConfig, RuntimeEnvironment, ServerConfig, Settings, ShapingConfig,
    TtsConfig, TtsProvider, LEGACY_ENV_KEYS,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{conversation, endpoints, timeouts};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed CORS, plain logs
    #[default]
    Development,
    Staging,
    Production,
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Speech-to-text provider
    #[serde(default)]
    pub asr: AsrConfig,

    /// Completion provider
    #[serde(default)]
    pub llm: LlmSettings,

    /// Text-to-speech provider
    #[serde(default)]
    pub tts: TtsConfig,

    /// Reply length limits
    #[serde(default)]
    pub shaping: ShapingConfig,

    /// Turn orchestration
    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_providers()?;
        self.validate_conversation()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "Port cannot be 0"));
        }
        if self.server.timeout_seconds == 0 {
            return Err(invalid("server.timeout_seconds", "Timeout must be positive"));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(invalid("server.max_upload_bytes", "Upload limit must be positive"));
        }
        if self.server.speaker_header.trim().is_empty() {
            return Err(invalid("server.speaker_header", "Header name cannot be empty"));
        }
        Ok(())
    }

    fn validate_providers(&self) -> Result<(), ConfigError> {
        if self.asr.url.trim().is_empty() {
            return Err(ConfigError::MissingField("asr.url".to_string()));
        }
        if self.llm.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingField("llm.endpoint".to_string()));
        }
        if self.tts.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("tts.base_url".to_string()));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(invalid(
                "llm.temperature",
                format!("Must be between 0.0 and 2.0, got {}", self.llm.temperature),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(invalid("llm.max_tokens", "Must be positive"));
        }
        if !(0.25..=4.0).contains(&self.tts.speed) {
            return Err(invalid(
                "tts.speed",
                format!("Must be between 0.25 and 4.0, got {}", self.tts.speed),
            ));
        }

        for (field, value) in [
            ("asr.timeout_ms", self.asr.timeout_ms),
            ("llm.timeout_ms", self.llm.timeout_ms),
            ("tts.timeout_ms", self.tts.timeout_ms),
        ] {
            if value == 0 {
                return Err(invalid(field, "Timeout must be positive"));
            }
        }
        Ok(())
    }

    fn validate_conversation(&self) -> Result<(), ConfigError> {
        if self.shaping.max_sentences == 0 {
            return Err(invalid("shaping.max_sentences", "At least one sentence is required"));
        }

        let conv = &self.conversation;
        if conv.greeting.trim().is_empty() {
            return Err(invalid("conversation.greeting", "Greeting cannot be empty"));
        }
        for (field, value) in [
            ("conversation.transcription_timeout_ms", conv.transcription_timeout_ms),
            ("conversation.suggestion_timeout_ms", conv.suggestion_timeout_ms),
            ("conversation.reply_timeout_ms", conv.reply_timeout_ms),
            ("conversation.synthesis_timeout_ms", conv.synthesis_timeout_ms),
        ] {
            if value == 0 {
                return Err(invalid(field, "Timeout must be positive"));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum multipart upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Header carrying the authenticated speaker's display name, set by the
    /// session layer in front of this service
    #[serde(default = "default_speaker_header")]
    pub speaker_header: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout() -> u64 {
    90
}
fn default_max_upload_bytes() -> usize {
    conversation::MAX_UPLOAD_BYTES
}
fn default_speaker_header() -> String {
    "x-user-name".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            max_upload_bytes: default_max_upload_bytes(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
            speaker_header: default_speaker_header(),
        }
    }
}

/// Speech-to-text provider variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AsrProvider {
    /// Whisper container with a multipart `audio_file` endpoint
    #[default]
    #[serde(alias = "docker", alias = "self-hosted")]
    SelfHosted,
    /// OpenAI-compatible transcription API (Groq and similar)
    #[serde(alias = "groq")]
    Cloud,
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrConfig {
    #[serde(default)]
    pub provider: AsrProvider,

    /// Full transcription URL
    #[serde(default = "default_asr_url")]
    pub url: String,

    /// Bearer token (required by the cloud provider)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name (required by the cloud provider)
    #[serde(default = "default_asr_model")]
    pub model: String,

    /// Spoken language; "auto" lets the cloud provider detect it
    #[serde(default = "default_asr_language")]
    pub language: String,

    #[serde(default = "default_asr_task")]
    pub task: String,

    /// Output format requested from the self-hosted provider
    #[serde(default = "default_asr_output")]
    pub output: String,

    #[serde(default = "default_asr_timeout")]
    pub timeout_ms: u64,
}

fn default_asr_url() -> String {
    endpoints::WHISPER_DEFAULT.to_string()
}
fn default_asr_model() -> String {
    "whisper-large-v3-turbo".to_string()
}
fn default_asr_language() -> String {
    "en".to_string()
}
fn default_asr_task() -> String {
    "transcribe".to_string()
}
fn default_asr_output() -> String {
    "json".to_string()
}
fn default_asr_timeout() -> u64 {
    timeouts::STT_TIMEOUT_MS
}

impl Default for AsrConfig {
    fn default() -> Self {
        Self {
            provider: AsrProvider::default(),
            url: default_asr_url(),
            api_key: None,
            model: default_asr_model(),
            language: default_asr_language(),
            task: default_asr_task(),
            output: default_asr_output(),
            timeout_ms: default_asr_timeout(),
        }
    }
}

/// Completion provider variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Any `/chat/completions` compatible API
    #[default]
    #[serde(alias = "openai-compatible", alias = "groq")]
    OpenAI,
    /// Local Ollama server
    Ollama,
}

/// Completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub provider: LlmProvider,

    /// API base URL
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_ms: u64,
}

fn default_llm_endpoint() -> String {
    endpoints::OPENAI_DEFAULT.to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_tokens() -> usize {
    256
}
fn default_temperature() -> f32 {
    0.7
}
fn default_llm_timeout() -> u64 {
    timeouts::LLM_REQUEST_MS
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: default_llm_endpoint(),
            api_key: None,
            model: default_llm_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_ms: default_llm_timeout(),
        }
    }
}

/// Text-to-speech provider variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TtsProvider {
    /// KittenTTS server (`/v1/audio/speech`, accepts `speed`)
    #[default]
    #[serde(alias = "kittentts", alias = "self-hosted")]
    SelfHosted,
    /// Groq speech API (`/openai/v1/audio/speech`, no `speed`)
    #[serde(alias = "groq")]
    Cloud,
}

/// Text-to-speech configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub provider: TtsProvider,

    /// Provider base URL; the speech path is appended per provider
    #[serde(default = "default_tts_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_tts_model")]
    pub model: String,

    #[serde(default = "default_tts_voice")]
    pub voice: String,

    #[serde(default = "default_tts_format")]
    pub response_format: String,

    #[serde(default = "default_tts_speed")]
    pub speed: f32,

    #[serde(default = "default_tts_timeout")]
    pub timeout_ms: u64,
}

fn default_tts_base_url() -> String {
    endpoints::KITTENTTS_DEFAULT.to_string()
}
fn default_tts_model() -> String {
    "kitten-tts".to_string()
}
fn default_tts_voice() -> String {
    "expr-voice-2-f".to_string()
}
fn default_tts_format() -> String {
    "mp3".to_string()
}
fn default_tts_speed() -> f32 {
    1.0
}
fn default_tts_timeout() -> u64 {
    timeouts::TTS_TIMEOUT_MS
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: TtsProvider::default(),
            base_url: default_tts_base_url(),
            api_key: None,
            model: default_tts_model(),
            voice: default_tts_voice(),
            response_format: default_tts_format(),
            speed: default_tts_speed(),
            timeout_ms: default_tts_timeout(),
        }
    }
}

/// Reply length limits applied before synthesis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapingConfig {
    #[serde(default = "default_max_sentences")]
    pub max_sentences: usize,

    /// Character cap; 0 disables it
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_sentences() -> usize {
    2
}
fn default_max_chars() -> usize {
    150
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self {
            max_sentences: default_max_sentences(),
            max_chars: default_max_chars(),
        }
    }
}

/// Turn orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Assistant turn that opens an empty conversation
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Display name when the session layer supplies none
    #[serde(default = "default_fallback_speaker")]
    pub fallback_speaker: String,

    #[serde(default = "default_transcription_timeout")]
    pub transcription_timeout_ms: u64,

    #[serde(default = "default_suggestion_timeout")]
    pub suggestion_timeout_ms: u64,

    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_ms: u64,

    #[serde(default = "default_synthesis_timeout")]
    pub synthesis_timeout_ms: u64,
}

fn default_greeting() -> String {
    conversation::GREETING.to_string()
}
fn default_fallback_speaker() -> String {
    conversation::FALLBACK_SPEAKER.to_string()
}
fn default_transcription_timeout() -> u64 {
    timeouts::STT_TIMEOUT_MS
}
fn default_suggestion_timeout() -> u64 {
    timeouts::SUGGESTION_MS
}
fn default_reply_timeout() -> u64 {
    timeouts::LLM_REQUEST_MS
}
fn default_synthesis_timeout() -> u64 {
    timeouts::TTS_TIMEOUT_MS
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            fallback_speaker: default_fallback_speaker(),
            transcription_timeout_ms: default_transcription_timeout(),
            suggestion_timeout_ms: default_suggestion_timeout(),
            reply_timeout_ms: default_reply_timeout(),
            synthesis_timeout_ms: default_synthesis_timeout(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Install the Prometheus recorder and serve `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Flat environment keys of existing deployments and the setting each one
/// overrides. Later entries win when two keys target the same setting.
pub const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("BACKEND_PORT", "server.port"),
    ("WHISPER_PROVIDER", "asr.provider"),
    ("ASR_PROVIDER", "asr.provider"),
    ("WHISPER_URL", "asr.url"),
    ("WHISPER_KEY", "asr.api_key"),
    ("WHISPER_MODEL", "asr.model"),
    ("LLM_PROVIDER", "llm.provider"),
    ("OPENAI_BASE_URL", "llm.endpoint"),
    ("OPENAI_KEY", "llm.api_key"),
    ("OPENAI_MODEL", "llm.model"),
    ("LLM_MODEL", "llm.model"),
    ("TTS_PROVIDER", "tts.provider"),
    ("TTS_BASE_URL", "tts.base_url"),
    ("TTS_API_KEY", "tts.api_key"),
    ("TTS_MODEL", "tts.model"),
    ("TTS_VOICE", "tts.voice"),
    ("TTS_SPEED", "tts.speed"),
    ("TTS_RESPONSE_FORMAT", "tts.response_format"),
];

/// Load settings from `config/` and the process environment
///
/// Priority (highest to lowest):
/// 1. Flat provider keys ([`LEGACY_ENV_KEYS`])
/// 2. Environment variables (`VOICE_TUTOR__` prefix, `__` separator)
/// 3. config/{env}.yaml|toml (if env specified)
/// 4. config/default.yaml|toml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env, |key| std::env::var(key).ok())
}

/// Load settings from `config_dir`, resolving flat provider keys through `lookup`
pub fn load_settings_from<F>(
    config_dir: &Path,
    env: Option<&str>,
    lookup: F,
) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder();

    let default_path = config_dir.join("default");
    builder = builder.add_source(File::with_name(&default_path.to_string_lossy()).required(false));

    if let Some(env_name) = env {
        let env_path = config_dir.join(env_name);
        builder = builder.add_source(File::with_name(&env_path.to_string_lossy()).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("VOICE_TUTOR")
            .separator("__")
            .try_parsing(true),
    );

    for (var, key) in LEGACY_ENV_KEYS {
        let value = lookup(var).filter(|v| !v.trim().is_empty());
        if value.is_some() {
            builder = builder.set_override_option(*key, value)?;
        }
    }

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

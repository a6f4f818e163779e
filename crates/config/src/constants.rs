//! Default values shared by the settings sections and provider clients

/// Provider endpoints
pub mod endpoints {
    /// Self-hosted whisper container
    pub const WHISPER_DEFAULT: &str = "http://localhost:9000/asr";

    /// OpenAI-compatible completion API
    pub const OPENAI_DEFAULT: &str = "https://api.openai.com/v1";

    /// Ollama LLM endpoint
    pub const OLLAMA_DEFAULT: &str = "http://localhost:11434";

    /// Self-hosted KittenTTS server
    pub const KITTENTTS_DEFAULT: &str = "http://localhost:8005";
}

/// Timeouts (in milliseconds)
pub mod timeouts {
    /// Transcription request timeout
    pub const STT_TIMEOUT_MS: u64 = 30_000;

    /// Completion request timeout
    pub const LLM_REQUEST_MS: u64 = 30_000;

    /// Suggestion generation budget
    pub const SUGGESTION_MS: u64 = 15_000;

    /// TTS synthesis timeout
    pub const TTS_TIMEOUT_MS: u64 = 15_000;
}

/// Conversation defaults
pub mod conversation {
    /// Assistant turn inserted when a conversation starts with no history
    pub const GREETING: &str = "Hello! What would you like to talk about today?";

    /// Display name used when the session collaborator supplies none
    pub const FALLBACK_SPEAKER: &str = "You";

    /// File name forwarded to ASR when the upload has none
    pub const DEFAULT_AUDIO_FILE_NAME: &str = "recording.mp3";

    /// Multipart upload limit (10 MiB)
    pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
}

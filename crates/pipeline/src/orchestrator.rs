//! Conversation Orchestrator
//!
//! Runs one learner turn end to end:
//! `Received → Transcribing → AwaitingCompletion → Filtering → Synthesizing
//! → Assembling → Done`, or `Failed` when transcription or the reply fails.
//!
//! The suggestion and the reply are requested concurrently. A missing
//! suggestion only hides the correction; missing audio only downgrades the
//! envelope to `partial_success`.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use voice_tutor_config::Settings;
use voice_tutor_core::{
    CompletionClient, ConversationTurn, EnvelopeParts, Error, ResponseEnvelope, Result,
    SpeechToText, SynthesisResult, TextToSpeech, VoiceParams,
};
use voice_tutor_llm::{
    create_completion_client, extract_suggestion, feedback_request, suggestion_request,
    tutor_prompt, FEEDBACK_SYSTEM_PROMPT, SUGGESTION_SYSTEM_PROMPT,
};
use voice_tutor_text_processing::suggestion::evaluate as evaluate_suggestion;
use voice_tutor_text_processing::{shape_with, ShapeLimits, SuggestionDecision};

use crate::fanout::{fan_out, guarded, FanOutTask};
use crate::stt::create_stt;
use crate::tts::{create_tts, voice_params};
use crate::PipelineError;

/// Message placed in a `partial_success` envelope when TTS could not be reached
pub const TTS_UNAVAILABLE: &str = "TTS service unavailable, text response only";

/// Message placed in a `partial_success` envelope when TTS answered without
/// audio. Provider detail stays in the logs.
pub const TTS_FAILED: &str = "TTS error, text response only";

/// Processing stage of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Transcribing,
    AwaitingCompletion,
    Filtering,
    Synthesizing,
    Assembling,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::Transcribing => "transcribing",
            PipelineStage::AwaitingCompletion => "awaiting_completion",
            PipelineStage::Filtering => "filtering",
            PipelineStage::Synthesizing => "synthesizing",
            PipelineStage::Assembling => "assembling",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Assistant turn that opens an empty conversation
    pub greeting: String,
    /// Display name when none is supplied
    pub fallback_speaker: String,
    /// File name forwarded to ASR when the upload has none
    pub default_file_name: String,
    pub shape_limits: ShapeLimits,
    pub voice: VoiceParams,
    pub transcription_timeout: Duration,
    pub suggestion_timeout: Duration,
    pub reply_timeout: Duration,
    pub synthesis_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl OrchestratorConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let conv = &settings.conversation;
        Self {
            greeting: conv.greeting.clone(),
            fallback_speaker: conv.fallback_speaker.clone(),
            default_file_name: voice_tutor_config::constants::conversation::DEFAULT_AUDIO_FILE_NAME
                .to_string(),
            shape_limits: ShapeLimits {
                max_sentences: settings.shaping.max_sentences,
                max_chars: settings.shaping.max_chars,
            },
            voice: voice_params(&settings.tts),
            transcription_timeout: Duration::from_millis(conv.transcription_timeout_ms),
            suggestion_timeout: Duration::from_millis(conv.suggestion_timeout_ms),
            reply_timeout: Duration::from_millis(conv.reply_timeout_ms),
            synthesis_timeout: Duration::from_millis(conv.synthesis_timeout_ms),
        }
    }
}

/// Input of one turn
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    /// Recorded learner audio
    pub audio: Vec<u8>,
    /// Upload file name; the configured default is used when absent
    pub file_name: Option<String>,
    /// Conversation so far, oldest first
    pub history: Vec<ConversationTurn>,
    pub speaker_name: Option<String>,
}

/// Wall-clock time spent per stage
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub transcription: Duration,
    /// Both completion calls, run concurrently
    pub completion: Duration,
    pub synthesis: Duration,
    pub total: Duration,
}

/// Result of a completed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub envelope: ResponseEnvelope,
    pub timings: StageTimings,
    /// Why the suggestion was shown or hidden
    pub suggestion_decision: SuggestionDecision,
}

/// Per-turn conversation orchestrator
///
/// Holds no per-conversation state; history travels with each request.
pub struct ConversationOrchestrator {
    stt: Arc<dyn SpeechToText>,
    llm: Arc<dyn CompletionClient>,
    tts: Arc<dyn TextToSpeech>,
    config: OrchestratorConfig,
}

impl ConversationOrchestrator {
    pub fn new(
        stt: Arc<dyn SpeechToText>,
        llm: Arc<dyn CompletionClient>,
        tts: Arc<dyn TextToSpeech>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            stt,
            llm,
            tts,
            config,
        }
    }

    /// Build the providers named in `settings` and wire them together
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let stt = create_stt(&settings.asr)?;
        let llm = create_completion_client(&settings.llm)?;
        let tts = create_tts(&settings.tts)?;
        Ok(Self::new(
            stt,
            llm,
            tts,
            OrchestratorConfig::from_settings(settings),
        ))
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn stt_provider(&self) -> &str {
        self.stt.provider_name()
    }

    pub fn completion_model(&self) -> &str {
        self.llm.model_name()
    }

    pub fn tts_provider(&self) -> &str {
        self.tts.provider_name()
    }

    /// Assistant turn that opens a conversation
    pub fn greeting_turn(&self) -> ConversationTurn {
        ConversationTurn::assistant(self.config.greeting.clone())
    }

    /// Supplied display name, or the configured fallback
    pub fn resolve_speaker(&self, speaker_name: Option<String>) -> String {
        speaker_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.config.fallback_speaker.clone())
    }

    /// Run one turn
    ///
    /// Returns `Err` only when transcription or the reply fails (or the
    /// request is cancelled before either finishes). The returned history is
    /// the input history, plus the greeting if it was empty, plus the new
    /// user and assistant turns.
    pub async fn run_turn(
        &self,
        request: TurnRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<TurnOutcome, PipelineError> {
        let started = Instant::now();
        let mut timings = StageTimings::default();

        self.enter(PipelineStage::Received);
        let speaker = self.resolve_speaker(request.speaker_name);
        let mut history = request.history;
        if history.is_empty() {
            history.push(self.greeting_turn());
        }

        // Transcribing
        self.enter(PipelineStage::Transcribing);
        if request.audio.is_empty() {
            return Err(self.failed(PipelineError::Transcription(Error::Validation(
                "audio is empty".to_string(),
            ))));
        }
        let file_name = request
            .file_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.config.default_file_name.clone());

        let stage_start = Instant::now();
        let transcript = guarded(
            self.config.transcription_timeout,
            cancel,
            self.stt.transcribe(&request.audio, &file_name),
        )
        .await
        .map_err(|e| self.failed(PipelineError::Transcription(e)))?;
        timings.transcription = stage_start.elapsed();

        let user_text = transcript.text.trim().to_string();
        tracing::info!(
            transcript = %user_text,
            language = %transcript.language,
            elapsed_ms = timings.transcription.as_millis() as u64,
            "Transcription complete"
        );

        // AwaitingCompletion
        self.enter(PipelineStage::AwaitingCompletion);
        let stage_start = Instant::now();
        let suggestion_input = suggestion_request(&history, &user_text);
        let persona = tutor_prompt(self.config.shape_limits.max_sentences);

        let tasks = vec![
            FanOutTask::new(
                "suggestion",
                self.config.suggestion_timeout,
                self.llm
                    .complete(SUGGESTION_SYSTEM_PROMPT, &[], &suggestion_input),
            ),
            FanOutTask::new(
                "reply",
                self.config.reply_timeout,
                self.llm.complete(&persona, &history, &user_text),
            ),
        ];
        let mut results = fan_out(tasks, cancel).await;
        timings.completion = stage_start.elapsed();

        let reply = results.pop().unwrap_or(Err(Error::Cancelled));
        let suggestion_raw = results.pop().unwrap_or(Err(Error::Cancelled));

        let reply = reply.map_err(|e| self.failed(PipelineError::Reply(e)))?;
        let suggestion_raw = match suggestion_raw {
            Ok(text) => extract_suggestion(&text),
            Err(e) => {
                tracing::warn!(error = %e, kind = e.kind(), "Suggestion generation failed");
                String::new()
            }
        };

        // Filtering
        self.enter(PipelineStage::Filtering);
        let decision = evaluate_suggestion(&user_text, &suggestion_raw);
        let suggestion = if decision.should_show() {
            suggestion_raw
        } else {
            String::new()
        };
        let reply = shape_with(&reply, self.config.shape_limits);
        tracing::debug!(
            decision = decision.as_str(),
            reply_chars = reply.chars().count(),
            "Suggestion filtered and reply shaped"
        );

        // Synthesizing
        self.enter(PipelineStage::Synthesizing);
        let stage_start = Instant::now();
        let speech = match guarded(
            self.config.synthesis_timeout,
            cancel,
            self.tts.synthesize(&reply, &self.config.voice),
        )
        .await
        {
            Ok(result) => match result.error() {
                Some(message) => {
                    tracing::warn!(error = %message, "TTS provider reported an error");
                    SynthesisResult::failed(TTS_FAILED)
                }
                None => result,
            },
            Err(e) => {
                tracing::warn!(error = %e, kind = e.kind(), "TTS request failed");
                SynthesisResult::failed(TTS_UNAVAILABLE)
            }
        };
        timings.synthesis = stage_start.elapsed();

        // Assembling
        self.enter(PipelineStage::Assembling);
        history.push(ConversationTurn::user(
            user_text.clone(),
            suggestion.clone(),
            speaker.clone(),
        ));
        history.push(ConversationTurn::assistant(reply.clone()));

        let envelope = ResponseEnvelope::assemble(
            EnvelopeParts {
                transcribed_text: user_text,
                reply,
                suggestion,
                speaker_name: speaker,
                history,
            },
            &speech,
        );
        timings.total = started.elapsed();

        self.enter(PipelineStage::Done);
        tracing::info!(
            status = ?envelope.status(),
            turns = envelope.history().len(),
            total_ms = timings.total.as_millis() as u64,
            "Turn complete"
        );

        Ok(TurnOutcome {
            envelope,
            timings,
            suggestion_decision: decision,
        })
    }

    /// Teacher-style feedback over a whole conversation, including a CEFR
    /// level estimate
    pub async fn generate_feedback(
        &self,
        history: &[ConversationTurn],
        cancel: &CancellationToken,
    ) -> std::result::Result<String, PipelineError> {
        let request = feedback_request(history);
        let feedback = guarded(
            self.config.reply_timeout,
            cancel,
            self.llm.complete(FEEDBACK_SYSTEM_PROMPT, &[], &request),
        )
        .await
        .map_err(|e| self.failed(PipelineError::Feedback(e)))?;

        tracing::info!(turns = history.len(), chars = feedback.len(), "Feedback generated");
        Ok(feedback.trim().to_string())
    }

    fn enter(&self, stage: PipelineStage) {
        tracing::debug!(stage = %stage, "Pipeline stage");
    }

    fn failed(&self, err: PipelineError) -> PipelineError {
        let source = err.source_error();
        tracing::warn!(
            stage = %PipelineStage::Failed,
            failed_at = %err.stage(),
            kind = source.kind(),
            error = %source,
            "Turn failed"
        );
        err
    }
}

//! Core traits and types for the voice tutor
//!
//! This crate provides foundational types used across all other crates:
//! - Conversation turns and history
//! - Transcription and synthesis results
//! - The response envelope returned for every orchestrated turn
//! - Provider traits (STT, completion, TTS)
//! - Error types

pub mod conversation;
pub mod envelope;
pub mod error;
pub mod speech;
pub mod traits;

pub use conversation::{ConversationTurn, TurnRole};
pub use envelope::{EnvelopeParts, EnvelopeStatus, ResponseEnvelope};
pub use error::{Error, Result};
pub use speech::{SynthesisResult, TranscriptionResult, VoiceParams};

pub use traits::{CompletionClient, SpeechToText, TextToSpeech};

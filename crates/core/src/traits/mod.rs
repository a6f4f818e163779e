//! Provider traits for the voice tutor
//!
//! Every external service sits behind one of these traits so the
//! orchestrator stays provider-agnostic and tests can swap in mocks.
//!
//! ```text
//! Speech Processing:
//!   - SpeechToText: Audio → Text transcription
//!   - TextToSpeech: Text → Audio synthesis
//!
//! Language Models:
//!   - CompletionClient: System prompt + history → reply text
//! ```

mod llm;
mod speech;

pub use llm::CompletionClient;
pub use speech::{SpeechToText, TextToSpeech};

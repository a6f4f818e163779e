//! Text Processing for the Voice Tutor
//!
//! This crate provides the pure text transforms of a conversation turn:
//! - **Normalization**: Canonical form for comparing learner text with corrections
//! - **Suggestion filtering**: Hide corrections that only change punctuation or case
//! - **Response shaping**: Strip emoji/markdown/links and bound reply length for TTS
//!
//! # Example
//!
//! ```ignore
//! use voice_tutor_text_processing::{shaper, suggestion};
//!
//! let reply = shaper::shape(raw_reply, 2, 150);
//! if suggestion::should_show(&transcript, &correction) {
//!     println!("Try saying: {}", correction);
//! }
//! ```

pub mod normalizer;
pub mod shaper;
pub mod suggestion;

pub use normalizer::{is_punctuation_only_diff, normalize};
pub use shaper::{shape, shape_with, ShapeLimits};
pub use suggestion::{should_show, SuggestionDecision};

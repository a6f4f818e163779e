//! Suggestion filter
//!
//! Hides generated corrections that say the same thing the learner said.

use crate::normalizer::{normalize, strip_non_word};

/// Why a suggestion was shown or hidden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionDecision {
    /// No suggestion was produced
    Empty,
    /// Identical to the utterance after normalization
    Identical,
    /// Differs only in punctuation
    PunctuationOnly,
    /// Meaningfully different, show it
    Show,
}

impl SuggestionDecision {
    pub fn should_show(&self) -> bool {
        matches!(self, SuggestionDecision::Show)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionDecision::Empty => "empty",
            SuggestionDecision::Identical => "identical",
            SuggestionDecision::PunctuationOnly => "punctuation_only",
            SuggestionDecision::Show => "show",
        }
    }
}

/// Classify a suggestion against the learner's utterance
pub fn evaluate(user_text: &str, suggestion: &str) -> SuggestionDecision {
    if suggestion.trim().is_empty() {
        return SuggestionDecision::Empty;
    }

    let normalized_suggestion = normalize(suggestion);
    let normalized_user = normalize(user_text);

    if normalized_suggestion == normalized_user {
        return SuggestionDecision::Identical;
    }

    if strip_non_word(&normalized_suggestion) == strip_non_word(&normalized_user) {
        return SuggestionDecision::PunctuationOnly;
    }

    SuggestionDecision::Show
}

/// Whether a suggestion is worth showing to the learner
pub fn should_show(user_text: &str, suggestion: &str) -> bool {
    evaluate(user_text, suggestion).should_show()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_text_hidden() {
        for s in ["", "hello", "I enjoy eating apples.", "Ça va?"] {
            assert!(!should_show(s, s), "shown for {:?}", s);
        }
    }

    #[test]
    fn test_real_correction_shown() {
        assert!(should_show(
            "I am like eating apple.",
            "I enjoy eating apples."
        ));
        assert_eq!(
            evaluate("I am like eating apple.", "I enjoy eating apples."),
            SuggestionDecision::Show
        );
    }

    #[test]
    fn test_punctuation_difference_hidden() {
        assert!(!should_show(
            "I enjoy eating apples.",
            "I enjoy eating apples"
        ));
        assert_eq!(
            evaluate("I enjoy eating apples.", "I enjoy eating apples"),
            SuggestionDecision::Identical
        );
    }

    #[test]
    fn test_contraction_and_case_hidden() {
        assert!(!should_show("I do not know", "I don't know"));
        assert!(should_show("i dont know", "I don't know"));
        assert!(!should_show("It\u{2019}s raining", "it is raining."));
    }

    #[test]
    fn test_blank_suggestion() {
        assert_eq!(evaluate("hello", "   "), SuggestionDecision::Empty);
        assert!(!should_show("hello", ""));
    }
}

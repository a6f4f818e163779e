//! Conversation turns
//!
//! History is an ordered, append-only list of turns owned by the caller.
//! Serialized field names match what browser clients already send
//! (`role`, `content`, `suggestion`, `user_name`).

use serde::{Deserialize, Serialize};

/// Role in a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// Learner utterance
    User,
    /// Tutor reply
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single turn in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Role of the speaker
    pub role: TurnRole,
    /// Content of the turn
    pub content: String,
    /// Corrected version of a learner utterance. Never set on assistant turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Display name of the learner
    #[serde(
        default,
        rename = "user_name",
        alias = "speaker_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub speaker_name: Option<String>,
}

impl ConversationTurn {
    /// Create a learner turn. An empty suggestion or speaker name is dropped.
    pub fn user(
        content: impl Into<String>,
        suggestion: impl Into<String>,
        speaker_name: impl Into<String>,
    ) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            suggestion: non_empty(suggestion.into()),
            speaker_name: non_empty(speaker_name.into()),
        }
    }

    /// Create a tutor turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            suggestion: None,
            speaker_name: None,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == TurnRole::User
    }

    /// Suggestion text, or "" when none was attached
    pub fn suggestion_text(&self) -> &str {
        self.suggestion.as_deref().unwrap_or("")
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_turn_drops_empty_fields() {
        let turn = ConversationTurn::user("hello", "", "");
        assert_eq!(turn.suggestion, None);
        assert_eq!(turn.speaker_name, None);

        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hello"}));
    }

    #[test]
    fn test_turn_wire_names() {
        let turn = ConversationTurn::user("I is happy", "I am happy", "Ana");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["suggestion"], "I am happy");
        assert_eq!(json["user_name"], "Ana");

        let parsed: ConversationTurn = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, turn);
    }

    #[test]
    fn test_history_parsing_rejects_unknown_role() {
        let raw = r#"[{"role":"narrator","content":"hi"}]"#;
        assert!(serde_json::from_str::<Vec<ConversationTurn>>(raw).is_err());

        let raw = r#"[{"role":"assistant","content":"Hello!"}]"#;
        let history: Vec<ConversationTurn> = serde_json::from_str(raw).unwrap();
        assert_eq!(history[0].role, TurnRole::Assistant);
        assert_eq!(history[0].suggestion_text(), "");
    }
}

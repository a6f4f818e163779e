//! Prompt building for the tutor
//!
//! Three call sites share the completion client: the tutor reply, the
//! grammar suggestion, and the end-of-conversation feedback.

use serde::{Deserialize, Serialize};
use std::fmt;

use voice_tutor_core::{ConversationTurn, TurnRole};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

impl From<TurnRole> for Role {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => Role::User,
            TurnRole::Assistant => Role::Assistant,
        }
    }
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// System message, then every history turn by role, then the latest user text
pub fn build_messages(
    system_prompt: &str,
    history: &[ConversationTurn],
    latest_user_text: &str,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend(history.iter().map(|turn| Message {
        role: turn.role.into(),
        content: turn.content.clone(),
    }));
    messages.push(Message::user(latest_user_text));
    messages
}

/// Tutor persona, with the reply length tied to the shaping sentence cap
pub fn tutor_prompt(max_sentences: usize) -> String {
    let n = max_sentences.max(1);
    let (limit, over) = match n {
        1 => ("maximum 1 sentence".to_string(), "1 sentence".to_string()),
        2 => ("maximum 1-2 sentences".to_string(), "2 sentences".to_string()),
        _ => (format!("maximum {} sentences", n), format!("{} sentences", n)),
    };

    format!(
        "You are a young lady named Voxy who chats with a new English learner. \
         Be nice and have a pleasant conversation. Ask questions to the user, express \
         opinion and tell interesting facts to keep the conversation going and talk about \
         yourself sometimes. When the conversation becomes stale try changing the topic. \
         Keep responses very short - {}. Decline any requests to write an essay or do \
         anything which will make your response over {} long.",
        limit, over
    )
}

pub const SUGGESTION_SYSTEM_PROMPT: &str = "You are given a conversation. Rewrite the last user response to make it correct according to the English language rules.
Enclose the rewritten and corrected sentence in a <suggestion></suggestion> tag.
Example:
user: I am like eating apple.
you: <suggestion>I enjoy eating apples.</suggestion>
If the sentence is already correct return an empty <suggestion> tag.
Example:
user: I enjoy eating apples.
you: <suggestion></suggestion>";

const SUGGESTION_OPEN: &str = "<suggestion>";
const SUGGESTION_CLOSE: &str = "</suggestion>";

/// User message for suggestion generation: the transcript as `role: content`
/// lines, then the utterance to correct
pub fn suggestion_request(history: &[ConversationTurn], user_text: &str) -> String {
    let mut request =
        String::from("You are given a chat between a user and an assistant for context:\n");
    for turn in history {
        request.push_str(turn.role.as_str());
        request.push_str(": ");
        request.push_str(&turn.content);
        request.push('\n');
    }
    request.push_str("\nSuggest a correction for the last user response:\nuser: ");
    request.push_str(user_text);
    request
}

/// Text between the first `<suggestion>` and the first `</suggestion>`,
/// trimmed. Missing tags or a close tag before the open tag yield "".
pub fn extract_suggestion(response: &str) -> String {
    let Some(open) = response.find(SUGGESTION_OPEN) else {
        return String::new();
    };
    let start = open + SUGGESTION_OPEN.len();
    match response.find(SUGGESTION_CLOSE) {
        Some(end) if end > start => response[start..end].trim().to_string(),
        _ => String::new(),
    }
}

pub const FEEDBACK_SYSTEM_PROMPT: &str =
    "You are a helpful and encouraging English teacher providing constructive feedback to students.";

/// Feedback request over a whole conversation
pub fn feedback_request(history: &[ConversationTurn]) -> String {
    let mut transcript = String::new();
    for turn in history {
        match turn.role {
            TurnRole::User => {
                transcript.push_str(&format!("Student: {}\n", turn.content));
                if let Some(suggestion) = turn.suggestion.as_deref().filter(|s| !s.is_empty()) {
                    transcript.push_str(&format!("Corrected: {}\n", suggestion));
                }
            }
            TurnRole::Assistant => {
                transcript.push_str(&format!("Teacher: {}\n", turn.content));
            }
        }
    }

    format!(
        "You are an experienced English teacher. Below is a conversation between a student and a teacher.
The student's turns include their original text and a corrected version when applicable.

Please analyze the conversation and provide constructive feedback on the student's English proficiency.
Focus on:
1. Recurring grammatical errors
2. Pronunciation issues (based on the transcriptions)
3. Vocabulary usage and suggestions for improvement
4. Sentence structure and fluency
5. Overall communication effectiveness
6. Grade the level of the student on the CEFR scale: A1, A2, B1, B2, C1 or C2

Provide specific examples from the conversation and suggestions for what the student should focus on to improve.

Conversation:
{}
Please provide your feedback:",
        transcript
    )
}

//! Response shaping for speech output
//!
//! Model replies are cleaned of things a TTS engine would read aloud badly
//! (emoji, markdown, links, HTML) and then bounded by a sentence budget and a
//! character budget. Character counts are Unicode scalar values.

use once_cell::sync::Lazy;
use regex::Regex;

/// Pictographic and symbol blocks removed from replies (inclusive ranges)
static EMOJI_RANGES: &[(u32, u32)] = &[
    (0x1F600, 0x1F64F), // Emoticons
    (0x1F300, 0x1F5FF), // Misc symbols and pictographs
    (0x1F680, 0x1F6FF), // Transport and map
    (0x1F700, 0x1F77F), // Alchemical symbols
    (0x1F780, 0x1F7FF), // Geometric shapes extended
    (0x1F800, 0x1F8FF), // Supplemental arrows-C
    (0x1F900, 0x1F9FF), // Supplemental symbols and pictographs
    (0x1FA00, 0x1FA6F), // Chess symbols
    (0x1FA70, 0x1FAFF), // Symbols and pictographs extended-A
    (0x2600, 0x26FF),   // Misc symbols
    (0x2700, 0x27BF),   // Dingbats
];

static MARKDOWN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*_~`#\[\]()|]").unwrap());
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

const ELLIPSIS: &str = "...";

/// Limits applied by [`shape`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeLimits {
    /// Maximum sentences; 0 disables the sentence cap
    pub max_sentences: usize,
    /// Maximum characters; 0 disables the character cap
    pub max_chars: usize,
}

impl Default for ShapeLimits {
    fn default() -> Self {
        Self {
            max_sentences: 2,
            max_chars: 150,
        }
    }
}

pub fn is_emoji(c: char) -> bool {
    let cp = c as u32;
    EMOJI_RANGES
        .iter()
        .any(|&(start, end)| (start..=end).contains(&cp))
}

/// Remove emoji, markdown control characters, URLs and HTML tags, then
/// collapse whitespace
pub fn sanitize(raw: &str) -> String {
    let text: String = raw.chars().filter(|c| !is_emoji(*c)).collect();
    let text = MARKDOWN.replace_all(&text, "");
    let text = URL.replace_all(&text, "");
    let text = HTML_TAG.replace_all(&text, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max_sentences` period-delimited sentences
pub fn limit_sentences(text: &str, max_sentences: usize) -> String {
    if max_sentences == 0 {
        return text.to_string();
    }
    let parts: Vec<&str> = text.split('.').collect();
    if parts.len() > max_sentences {
        format!("{}.", parts[..max_sentences].join("."))
    } else {
        text.to_string()
    }
}

/// Bound `text` to `max_chars` characters.
///
/// The cut is re-anchored to the last period inside the limit. Without one,
/// it falls back to the last space plus an ellipsis, and finally to a hard
/// cut plus an ellipsis. The ellipsis counts against the limit.
pub fn limit_chars(text: &str, max_chars: usize) -> String {
    if max_chars == 0 || text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = take_chars(text, max_chars);
    if let Some(dot) = cut.rfind('.') {
        return cut[..=dot].to_string();
    }

    if max_chars <= ELLIPSIS.len() {
        return cut.to_string();
    }

    let room = take_chars(text, max_chars - ELLIPSIS.len());
    match room.rfind(' ') {
        Some(space) => format!("{}{}", room[..space].trim_end(), ELLIPSIS),
        None => format!("{}{}", room, ELLIPSIS),
    }
}

/// Full shaping pass: sanitize, then sentence cap, then character cap
pub fn shape(raw: &str, max_sentences: usize, max_chars: usize) -> String {
    let cleaned = sanitize(raw);
    let limited = limit_sentences(&cleaned, max_sentences);
    limit_chars(&limited, max_chars)
}

/// Shape with a [`ShapeLimits`] value
pub fn shape_with(raw: &str, limits: ShapeLimits) -> String {
    shape(raw, limits.max_sentences, limits.max_chars)
}

/// Number of non-empty period-delimited sentences
pub fn sentence_count(text: &str) -> usize {
    text.split('.').filter(|s| !s.trim().is_empty()).count()
}

fn take_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

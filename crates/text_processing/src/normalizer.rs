//! Text normalization for comparing learner utterances with corrections
//!
//! Canonical form:
//! 1. Apostrophe and quote variants mapped to `'`
//! 2. English contractions expanded ("isn't" → "is not")
//! 3. Everything except letters, digits and whitespace removed
//! 4. Lowercased
//! 5. Whitespace collapsed and trimmed
//!
//! `normalize(normalize(s)) == normalize(s)` holds for every input.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Characters treated as an apostrophe. Covers typographic quotes, accents
/// used as apostrophes, guillemets, and CJK corner brackets.
static APOSTROPHE_VARIANTS: &[char] = &[
    '\u{2019}', // ’
    '\u{2018}', // ‘
    '`',
    '\u{00B4}', // ´
    '\u{02B9}', // ʹ
    '\u{02BB}', // ʻ
    '\u{02BC}', // ʼ
    '\u{02BD}', // ʽ
    '\u{02BE}', // ʾ
    '\u{02BF}', // ʿ
    '\u{02CA}', // ˊ
    '\u{02CB}', // ˋ
    '\u{02F4}', // ˴
    '\u{0374}', // ʹ (Greek numeral sign)
    '\u{0384}', // ΄
    '\u{055A}', // ՚
    '\u{05F3}', // ׳
    '\u{05F4}', // ״
    '\u{FF07}', // ＇
    '\u{201C}', // “
    '\u{201D}', // ”
    '\u{201E}', // „
    '\u{00AB}', // «
    '\u{00BB}', // »
    '\u{300C}', // 「
    '\u{300D}', // 」
    '\u{300E}', // 『
    '\u{300F}', // 』
    '\u{301D}', // 〝
    '\u{301E}', // 〞
    '\u{301F}', // 〟
    '\u{FF02}', // ＂
];

/// Contractions and their expansions, keyed in lowercase
static CONTRACTIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();

    // be
    map.insert("i'm", "i am");
    map.insert("you're", "you are");
    map.insert("he's", "he is");
    map.insert("she's", "she is");
    map.insert("it's", "it is");
    map.insert("we're", "we are");
    map.insert("they're", "they are");
    map.insert("that's", "that is");
    map.insert("who's", "who is");
    map.insert("what's", "what is");
    map.insert("where's", "where is");
    map.insert("when's", "when is");
    map.insert("why's", "why is");
    map.insert("how's", "how is");

    // negations
    map.insert("isn't", "is not");
    map.insert("aren't", "are not");
    map.insert("wasn't", "was not");
    map.insert("weren't", "were not");
    map.insert("haven't", "have not");
    map.insert("hasn't", "has not");
    map.insert("hadn't", "had not");
    map.insert("don't", "do not");
    map.insert("doesn't", "does not");
    map.insert("didn't", "did not");
    map.insert("won't", "will not");
    map.insert("wouldn't", "would not");
    map.insert("can't", "cannot");
    map.insert("couldn't", "could not");
    map.insert("shouldn't", "should not");
    map.insert("mightn't", "might not");
    map.insert("mustn't", "must not");

    // would
    map.insert("i'd", "i would");
    map.insert("you'd", "you would");
    map.insert("he'd", "he would");
    map.insert("she'd", "she would");
    map.insert("it'd", "it would");
    map.insert("we'd", "we would");
    map.insert("they'd", "they would");

    // will
    map.insert("i'll", "i will");
    map.insert("you'll", "you will");
    map.insert("he'll", "he will");
    map.insert("she'll", "she will");
    map.insert("it'll", "it will");
    map.insert("we'll", "we will");
    map.insert("they'll", "they will");

    // have
    map.insert("i've", "i have");
    map.insert("you've", "you have");
    map.insert("we've", "we have");
    map.insert("they've", "they have");

    map
});

/// Trailing punctuation ignored when looking a token up in the contraction table
const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';'];

/// Anything that is not a word character or whitespace
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Map every apostrophe variant to `'`
pub fn unify_apostrophes(text: &str) -> String {
    text.chars()
        .map(|c| if APOSTROPHE_VARIANTS.contains(&c) { '\'' } else { c })
        .collect()
}

/// Expand contractions token by token.
///
/// Tokens are split on whitespace and rejoined with single spaces. A token
/// that matches drops its trailing punctuation along with the contraction.
pub fn expand_contractions(text: &str) -> String {
    let unified = unify_apostrophes(text);
    unified
        .split_whitespace()
        .map(|word| {
            let lookup = word.trim_end_matches(TRAILING_PUNCTUATION).to_lowercase();
            match CONTRACTIONS.get(lookup.as_str()) {
                Some(expanded) => (*expanded).to_string(),
                None => word.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonicalize text for equality comparison
pub fn normalize(text: &str) -> String {
    let expanded = expand_contractions(text);

    let folded: String = expanded
        .chars()
        .filter(|c| is_kept(*c))
        .flat_map(char::to_lowercase)
        // Lowercasing can emit combining marks (e.g. 'İ'); drop them too.
        .filter(|c| is_kept(*c))
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when `a` and `b` differ only in case, punctuation, apostrophe style,
/// or contraction form
pub fn is_punctuation_only_diff(a: &str, b: &str) -> bool {
    let na = normalize(a);
    let nb = normalize(b);
    na == nb || strip_non_word(&na) == strip_non_word(&nb)
}

/// Remove every non-word, non-whitespace character
pub fn strip_non_word(text: &str) -> String {
    NON_WORD.replace_all(text, "").into_owned()
}

fn is_kept(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apostrophe_variants() {
        assert_eq!(unify_apostrophes("don\u{2019}t"), "don't");
        assert_eq!(unify_apostrophes("\u{00AB}hi\u{00BB}"), "'hi'");
        assert_eq!(unify_apostrophes("it`s"), "it's");
    }

    #[test]
    fn test_contraction_expansion() {
        assert_eq!(expand_contractions("I'm here."), "i am here.");
        assert_eq!(expand_contractions("Yes, I'm."), "Yes, i am");
        assert_eq!(expand_contractions("It ISN'T fine"), "It is not fine");
        assert_eq!(expand_contractions("I can\u{2019}t!"), "I cannot");
        assert_eq!(expand_contractions("they'll  come"), "they will come");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Hello,   World!  "), "hello world");
        assert_eq!(normalize("I'm fine."), "i am fine");
        assert_eq!(normalize("I am fine"), "i am fine");
        assert_eq!(normalize("It\u{2019}s a dog's life"), "it is a dogs life");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("?!..."), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        let samples = [
            "I enjoy eating apples.",
            "Don\u{2019}t   STOP me now!!",
            "«Quoted» and `ticked` text; with, punctuation?",
            "\u{0130}stanbul is big",
            "caf\u{00E9} na\u{00EF}ve r\u{00E9}sum\u{00E9}",
            "snake_case and tabs\tand\nnewlines",
            "They've we'd you'll it'd",
            "\u{1F600} emoji only",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_punctuation_only_diff() {
        assert!(is_punctuation_only_diff(
            "I enjoy eating apples.",
            "I enjoy eating apples"
        ));
        assert!(is_punctuation_only_diff("I'm ok", "I am OK!"));
        assert!(!is_punctuation_only_diff(
            "I am like eating apple.",
            "I enjoy eating apples."
        ));
    }
}

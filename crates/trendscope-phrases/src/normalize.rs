//! Text cleanup and tokenization ahead of n-gram counting.

use std::sync::LazyLock;

use regex::Regex;

use crate::stopwords::is_stopword;

// Keeps word characters, whitespace, and light punctuation; emoji and
// symbols become spaces.
static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,!?'\-]").expect("valid regex"));

/// Replaces disallowed characters with spaces, collapses whitespace runs,
/// and lowercases.
#[must_use]
pub fn normalize(text: &str) -> String {
    let cleaned = DISALLOWED_RE.replace_all(text, " ");
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Splits normalized text into tokens, dropping single-character tokens and
/// stopwords.
#[must_use]
pub fn tokenize(normalized: &str) -> Vec<&str> {
    normalized
        .split_whitespace()
        .filter(|token| token.chars().count() > 1 && !is_stopword(token))
        .collect()
}

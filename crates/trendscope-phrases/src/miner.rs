//! N-gram counting, quality filtering, and near-duplicate suppression.

use std::collections::HashMap;

use trendscope_core::PhraseCount;

use crate::normalize::{normalize, tokenize};

/// Phrases seen fewer times than this are never reported.
pub const MIN_PHRASE_COUNT: u32 = 3;

const MIN_TEXT_CHARS: usize = 5;
const MIN_NGRAM: usize = 2;
const MAX_NGRAM: usize = 5;

/// Running tally that remembers the order in which phrases first appeared.
#[derive(Debug, Default)]
struct PhraseTally {
    index: HashMap<String, usize>,
    entries: Vec<(String, u32)>,
}

impl PhraseTally {
    fn bump(&mut self, phrase: String) {
        if let Some(&i) = self.index.get(&phrase) {
            self.entries[i].1 += 1;
        } else {
            self.index.insert(phrase.clone(), self.entries.len());
            self.entries.push((phrase, 1));
        }
    }

    /// Entries by count descending. The sort is stable, so equal counts keep
    /// first-seen order.
    fn into_ranked(mut self) -> Vec<(String, u32)> {
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        self.entries
    }
}

/// Mines up to `limit` recurring phrases of 2 to 5 words from `texts`.
///
/// Only phrases seen at least [`MIN_PHRASE_COUNT`] times qualify. A phrase
/// that contains, or is contained in, a higher-ranked accepted phrase is
/// dropped, so `"great video"` suppresses `"great video content"` when it
/// ranks first.
#[must_use]
pub fn mine<S: AsRef<str>>(texts: &[S], limit: usize) -> Vec<PhraseCount> {
    if limit == 0 {
        return Vec::new();
    }

    let mut tally = PhraseTally::default();
    let mut texts_used: usize = 0;

    for text in texts {
        let text = text.as_ref();
        if text.trim().chars().count() < MIN_TEXT_CHARS {
            continue;
        }

        let normalized = normalize(text);
        let tokens = tokenize(&normalized);
        if tokens.len() < MIN_NGRAM {
            continue;
        }
        texts_used += 1;

        for n in MIN_NGRAM..=MAX_NGRAM {
            for window in tokens.windows(n) {
                if is_quality_phrase(window) {
                    tally.bump(window.join(" "));
                }
            }
        }
    }

    let candidates = tally.into_ranked();
    tracing::debug!(
        texts = texts.len(),
        texts_used,
        candidates = candidates.len(),
        "phrase candidates counted"
    );

    select(candidates, limit)
}

/// Rejects repetitive phrases and longer phrases made mostly of short words.
fn is_quality_phrase(words: &[&str]) -> bool {
    let len = words.len();

    let mut distinct: Vec<&str> = words.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    // distinct / len >= 0.7, in integers
    if distinct.len() * 10 < len * 7 {
        return false;
    }

    if len > 2 {
        let short = words.iter().filter(|w| w.chars().count() < 3).count();
        if short * 2 > len {
            return false;
        }
    }

    true
}

/// Walks the top `2 * limit` candidates and accepts those that clear the
/// frequency floor and do not overlap an already-accepted phrase.
fn select(candidates: Vec<(String, u32)>, limit: usize) -> Vec<PhraseCount> {
    let mut accepted: Vec<PhraseCount> = Vec::with_capacity(limit);

    for (phrase, count) in candidates.into_iter().take(limit.saturating_mul(2)) {
        if count < MIN_PHRASE_COUNT {
            continue;
        }

        let lower = phrase.to_lowercase();
        let overlaps = accepted.iter().any(|existing| {
            let existing = existing.phrase.to_lowercase();
            existing == lower || existing.contains(&lower) || lower.contains(&existing)
        });
        if overlaps {
            continue;
        }

        accepted.push(PhraseCount { phrase, count });
        if accepted.len() >= limit {
            break;
        }
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeat(text: &str, times: usize) -> Vec<String> {
        std::iter::repeat_n(text.to_string(), times).collect()
    }

    fn phrases(result: &[PhraseCount]) -> Vec<&str> {
        result.iter().map(|p| p.phrase.as_str()).collect()
    }

    #[test]
    fn empty_input_yields_nothing() {
        let texts: Vec<String> = Vec::new();
        assert!(mine(&texts, 10).is_empty());
    }

    #[test]
    fn zero_limit_yields_nothing() {
        assert!(mine(&repeat("amazing dance moves", 5), 0).is_empty());
    }

    #[test]
    fn phrases_below_threshold_are_absent() {
        let texts = vec![
            "i love this so much".to_string(),
            "i love this so much".to_string(),
            "great video great content".to_string(),
        ];
        assert!(mine(&texts, 5).is_empty());
    }

    #[test]
    fn phrase_in_two_comments_is_excluded_and_three_is_included() {
        let mut texts = repeat("cute puppy", 2);
        texts.extend(repeat("amazing dance moves", 3));

        let result = mine(&texts, 5);

        assert_eq!(phrases(&result), vec!["amazing dance", "dance moves"]);
        assert!(result.iter().all(|p| p.count == 3));
    }

    #[test]
    fn output_is_deterministic_for_identical_input() {
        let mut texts = repeat("amazing dance moves", 4);
        texts.extend(repeat("sick beat drop", 4));
        texts.extend(repeat("funny cat video", 4));

        assert_eq!(mine(&texts, 10), mine(&texts, 10));
    }

    #[test]
    fn higher_ranked_substring_suppresses_superstring() {
        let mut texts = repeat("great video", 6);
        texts.extend(repeat("great video content", 4));

        let result = mine(&texts, 10);

        assert_eq!(result[0].phrase, "great video");
        assert_eq!(result[0].count, 10);
        assert!(!phrases(&result).contains(&"great video content"));
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let mut texts = repeat("zesty lemon tart", 3);
        texts.extend(repeat("amazing dance moves", 3));

        let result = mine(&texts, 10);

        assert_eq!(
            phrases(&result),
            vec!["zesty lemon", "lemon tart", "amazing dance", "dance moves"]
        );
    }

    #[test]
    fn repetitive_phrases_are_rejected() {
        assert!(mine(&repeat("go go go go", 5), 5).is_empty());
    }

    #[test]
    fn mostly_short_word_trigrams_are_rejected() {
        let result = mine(&repeat("ab cd ef", 3), 5);
        assert_eq!(phrases(&result), vec!["ab cd", "cd ef"]);
    }

    #[test]
    fn short_texts_are_skipped() {
        assert!(mine(&repeat("ab c", 10), 5).is_empty());
    }

    #[test]
    fn case_and_emoji_are_normalized_away() {
        let mut texts = repeat("Cool 🔥 BEAT", 2);
        texts.push("cool beat".to_string());

        let result = mine(&texts, 5);

        assert_eq!(phrases(&result), vec!["cool beat"]);
        assert_eq!(result[0].count, 3);
    }

    #[test]
    fn stops_at_limit() {
        let mut texts = repeat("zesty lemon tart", 3);
        texts.extend(repeat("amazing dance moves", 3));

        let result = mine(&texts, 1);

        assert_eq!(phrases(&result), vec!["zesty lemon"]);
    }

    #[test]
    fn quality_filter_thresholds() {
        assert!(is_quality_phrase(&["great", "video"]));
        assert!(!is_quality_phrase(&["go", "go"]));
        // 3 distinct of 4 is 75%, above the 70% floor
        assert!(is_quality_phrase(&["great", "video", "great", "content"]));
        // 2 distinct of 3 is 67%
        assert!(!is_quality_phrase(&["great", "video", "great"]));
        // two short words of three
        assert!(!is_quality_phrase(&["ab", "cd", "dance"]));
        // one short word of three
        assert!(is_quality_phrase(&["ab", "dance", "moves"]));
    }
}

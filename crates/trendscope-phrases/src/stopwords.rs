//! Fixed stopword set for comment tokenization.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Function words, chat filler, and generic quantifiers that never anchor a
/// meaningful phrase. Entries are lowercase and compared after normalization.
pub(crate) const STOPWORDS: &[&str] = &[
    // Articles, pronouns, prepositions
    "the", "and", "for", "that", "with", "this", "you", "your", "are", "was", "but", "not",
    "have", "has", "just", "like", "get", "got", "all", "out", "too", "can", "she", "him",
    "her", "his", "our", "they", "from", "who", "had", "did", "its", "i", "me", "my", "we",
    "he", "it", "to", "of", "in", "on", "is", "a", "an", "at", "as", "so", "be", "by", "or",
    "if", "do", "no", "yes", "up", "down", "off", "these", "those", "their", "them", "then",
    "than", "will", "would", "should", "could", "about", "over", "under", "again", "when",
    "where", "why", "how", "what", "which", "because", "while", "were", "been", "am",
    // Contractions with the apostrophe already dropped
    "im", "u", "ur", "isnt", "dont", "doesnt", "cant", "wont", "youre", "youve", "youll",
    "youd", "hes", "shes", "theyre", "weve", "we're", "ive", "ill", "id", "didnt", "wasnt",
    "arent", "havent", "hasnt", "hadnt", "couldnt", "shouldnt", "wouldnt",
    // Chat filler
    "oh", "ok", "okay", "yeah", "nah", "huh", "hmm", "lol", "lmao", "omg", "pls", "please",
    "thanks", "thank", "welcome", "hi", "hey", "yo", "sup", "bye", "goodbye", "see", "ya",
    // Time, size, and degree
    "later", "soon", "now", "never", "always", "sometimes", "often", "usually", "rarely",
    "seldom", "once", "twice", "first", "last", "next", "new", "old", "young", "big",
    "small", "large", "little", "long", "short", "high", "low", "early", "late", "best",
    "worst", "better", "worse", "same", "different", "other", "another",
    // Quantifiers and numerals
    "more", "most", "less", "least", "many", "much", "few", "several", "some", "any",
    "every", "each", "either", "neither", "both", "none", "one", "two", "three", "four",
    "five", "six", "seven", "eight", "nine", "ten",
];

static STOPWORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS.iter().copied().collect());

/// Returns `true` if `token` is in the stopword set. `token` must already be
/// lowercase.
#[must_use]
pub fn is_stopword(token: &str) -> bool {
    STOPWORD_SET.contains(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_function_words_are_stopwords() {
        for word in ["the", "and", "i", "lol", "ten", "we're"] {
            assert!(is_stopword(word), "{word} should be a stopword");
        }
    }

    #[test]
    fn content_words_are_not_stopwords() {
        for word in ["dance", "video", "love", "amazing", "recipe"] {
            assert!(!is_stopword(word), "{word} should not be a stopword");
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(!is_stopword("The"));
    }

    #[test]
    fn all_entries_are_lowercase() {
        for word in STOPWORDS {
            assert_eq!(*word, word.to_lowercase());
        }
    }
}

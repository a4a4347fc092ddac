//! Tokenizer shared by keyword extraction, vectorization, and ranking.
//!
//! Lower-cases, turns every non-alphanumeric character into a separator, and drops
//! stop words and tokens of two characters or fewer.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Tokens at or below this character count are discarded.
pub const MIN_TOKEN_CHARS: usize = 3;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "and", "for", "with", "you", "your", "are", "our", "will", "this", "that",
        "from", "have", "has", "had", "not", "but", "all", "any", "can", "who", "what", "when",
        "where", "which", "why", "how", "was", "were", "been", "being", "into", "onto", "about",
        "over", "under", "than", "then", "them", "they", "their", "there", "these", "those",
        "its", "his", "her", "she", "him", "our", "ours", "out", "also", "such", "each", "other",
        "some", "more", "most", "very", "just", "only", "own", "same", "both", "may", "must",
        "should", "would", "could", "shall", "might", "able", "per", "via", "etc", "one", "two",
        "well", "within", "across", "including", "while", "through", "upon", "does", "did",
        "doing", "get", "got", "let", "new", "use", "using", "used", "way", "work", "working",
        "team", "role", "join", "like", "make", "help", "strong", "good", "great", "plus",
    ]
    .into_iter()
    .collect()
});

/// Returns `true` if `word` (already lower-cased) is in the stop-word list.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// Splits `text` into lower-cased raw words without filtering.
pub fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Tokenizes `text` into content-bearing terms, in reading order, duplicates kept.
pub fn tokenize(text: &str) -> Vec<String> {
    words(text)
        .into_iter()
        .filter(|w| w.chars().count() >= MIN_TOKEN_CHARS && !is_stop_word(w))
        .collect()
}

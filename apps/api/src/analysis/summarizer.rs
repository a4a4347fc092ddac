//! Summarizer — extractive condensation of a text blob in one of three modes.
//!
//! Every mode is total: ranking failures degrade to a simpler mode, and empty input
//! yields a fixed placeholder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::textrank::{rank_keywords, rank_sentences};

pub const NO_CONTENT_MESSAGE: &str = "No content available to summarize.";
pub const NO_BUZZ_MESSAGE: &str = "Nothing to buzz about yet.";

const STORY_SENTENCES: usize = 5;
const STORY_PREAMBLE: &str = "Here's the story.";
const STORY_POSTAMBLE: &str = "That's the heart of it.";
const HEADLINE_MAX_CHARS: usize = 120;
const BUZZ_MAX_CHARS: usize = 200;
const BUZZ_KEYWORDS: usize = 3;
const RAW_FALLBACK_SENTENCES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    Beginner,
    Story,
    Buzz,
}

impl fmt::Display for SummaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SummaryMode::Beginner => "beginner",
            SummaryMode::Story => "story",
            SummaryMode::Buzz => "buzz",
        };
        f.write_str(name)
    }
}

impl FromStr for SummaryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(SummaryMode::Beginner),
            "story" => Ok(SummaryMode::Story),
            "buzz" => Ok(SummaryMode::Buzz),
            other => Err(format!(
                "unknown summary mode '{other}' (expected beginner, story or buzz)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub mode: SummaryMode,
    pub summary: String,
}

pub fn summarize(text: &str, mode: SummaryMode) -> SummaryResult {
    let summary = match mode {
        SummaryMode::Beginner => beginner(text),
        SummaryMode::Story => story(text),
        SummaryMode::Buzz => buzz(text),
    };
    SummaryResult { mode, summary }
}

/// Splits on `.`, `!` or `?` followed by whitespace or end of text.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().map_or(true, |next| next.is_whitespace());
        if at_boundary {
            push_sentence(&mut sentences, &current);
            current.clear();
        }
    }
    push_sentence(&mut sentences, &current);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let trimmed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}

fn word_count(sentence: &str) -> usize {
    sentence
        .split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

/// Top N sentences by length and earliness, in reading order.
fn beginner(text: &str) -> String {
    if text.trim().is_empty() {
        return NO_CONTENT_MESSAGE.to_string();
    }

    let sentences = split_sentences(text);
    let candidates: Vec<(usize, &String)> = sentences
        .iter()
        .enumerate()
        .filter(|(_, s)| word_count(s) > 0)
        .collect();

    if candidates.is_empty() {
        let raw = sentences
            .iter()
            .take(RAW_FALLBACK_SENTENCES)
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        return if raw.is_empty() {
            NO_CONTENT_MESSAGE.to_string()
        } else {
            raw
        };
    }

    let count = candidates.len();
    let target = beginner_target(count);
    let max_words = candidates
        .iter()
        .map(|(_, s)| word_count(s))
        .max()
        .unwrap_or(1)
        .max(1) as f64;

    let mut scored: Vec<(usize, f64)> = candidates
        .iter()
        .enumerate()
        .map(|(rank, (i, s))| {
            let length = word_count(s) as f64 / max_words;
            let earliness = 1.0 - rank as f64 / count as f64;
            (*i, 0.5 * length + 0.5 * earliness)
        })
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    scored.truncate(target);
    scored.sort_by_key(|(i, _)| *i);

    scored
        .iter()
        .map(|(i, _)| sentences[*i].as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// N = max(3, min(5, ceil(0.25 × count))).
fn beginner_target(count: usize) -> usize {
    count.div_ceil(4).clamp(3, 5)
}

fn story(text: &str) -> String {
    if text.trim().is_empty() {
        return beginner(text);
    }
    let sentences = split_sentences(text);
    match rank_sentences(&sentences, STORY_SENTENCES) {
        Ok(picked) if !picked.is_empty() => {
            let body = picked
                .iter()
                .map(|&i| sentences[i].as_str())
                .collect::<Vec<_>>()
                .join(" ");
            format!("{STORY_PREAMBLE} {body} {STORY_POSTAMBLE}")
        }
        Ok(_) => beginner(text),
        Err(e) => {
            debug!("story ranking failed ({e}), using beginner summary");
            beginner(text)
        }
    }
}

fn buzz(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return NO_BUZZ_MESSAGE.to_string();
    }

    let first = trimmed.split('.').next().unwrap_or(trimmed).trim();
    let headline = truncate_chars(first, HEADLINE_MAX_CHARS);

    let keywords = match rank_keywords(trimmed, BUZZ_KEYWORDS) {
        Ok(keywords) if !keywords.is_empty() => keywords,
        Ok(_) => fallback_buzzwords(trimmed),
        Err(e) => {
            debug!("buzz keyword ranking failed ({e}), using long words");
            fallback_buzzwords(trimmed)
        }
    };

    let combined = match (headline.is_empty(), keywords.is_empty()) {
        (true, true) => NO_BUZZ_MESSAGE.to_string(),
        (false, true) => headline,
        (true, false) => format!("Buzzwords: {}", keywords.join(", ")),
        (false, false) => format!("{headline} | Buzzwords: {}", keywords.join(", ")),
    };
    truncate_chars(&combined, BUZZ_MAX_CHARS)
}

/// First few words longer than four characters.
fn fallback_buzzwords(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.chars().count() > 4)
        .take(BUZZ_KEYWORDS)
        .map(str::to_string)
        .collect()
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABSTRACT: &str = "Large language models are trained on web-scale text. \
        Training such models requires careful data curation and significant compute. \
        We study how data curation affects downstream reasoning in language models. \
        Our experiments cover twelve benchmarks. \
        Curated data consistently improves reasoning accuracy of language models. \
        The weather was pleasant that week. \
        We release our curated data and training code.";

    #[test]
    fn test_every_mode_is_total_on_empty_and_junk() {
        for mode in [SummaryMode::Beginner, SummaryMode::Story, SummaryMode::Buzz] {
            for input in ["", "   ", "...", "!!! ???", "a", "x."] {
                let result = summarize(input, mode);
                assert_eq!(result.mode, mode);
                assert!(!result.summary.is_empty(), "{mode} on {input:?}");
            }
        }
    }

    #[test]
    fn test_beginner_empty_text_placeholder() {
        assert_eq!(summarize("", SummaryMode::Beginner).summary, NO_CONTENT_MESSAGE);
    }

    #[test]
    fn test_split_sentences() {
        let s = split_sentences("One. Two!  Three? v1.2 is out");
        assert_eq!(s, vec!["One.", "Two!", "Three?", "v1.2 is out"]);
    }

    #[test]
    fn test_beginner_target_bounds() {
        assert_eq!(beginner_target(1), 3);
        assert_eq!(beginner_target(12), 3);
        assert_eq!(beginner_target(13), 4);
        assert_eq!(beginner_target(100), 5);
    }

    #[test]
    fn test_beginner_keeps_reading_order() {
        let summary = summarize(ABSTRACT, SummaryMode::Beginner).summary;
        let sentences = split_sentences(ABSTRACT);
        let positions: Vec<usize> = sentences
            .iter()
            .filter_map(|s| summary.find(s.as_str()))
            .collect();
        assert_eq!(positions.len(), 3, "summary was {summary}");
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(summary.starts_with("Large language models"));
    }

    #[test]
    fn test_beginner_short_text_returns_everything() {
        let text = "Short one. Another short one.";
        assert_eq!(summarize(text, SummaryMode::Beginner).summary, text);
    }

    #[test]
    fn test_story_wraps_ranked_sentences() {
        let summary = summarize(ABSTRACT, SummaryMode::Story).summary;
        assert!(summary.starts_with(STORY_PREAMBLE));
        assert!(summary.ends_with(STORY_POSTAMBLE));
        assert!(!summary.contains("weather"), "off-topic sentence kept: {summary}");
    }

    #[test]
    fn test_story_falls_back_to_beginner_without_content_words() {
        let text = "It is. So it was. And so on.";
        assert_eq!(
            summarize(text, SummaryMode::Story).summary,
            summarize(text, SummaryMode::Beginner).summary
        );
    }

    #[test]
    fn test_buzz_headline_and_keywords() {
        let summary = summarize(ABSTRACT, SummaryMode::Buzz).summary;
        assert!(summary.starts_with("Large language models are trained on web-scale text"));
        assert!(summary.contains("| Buzzwords: "));
        assert!(summary.chars().count() <= BUZZ_MAX_CHARS);
    }

    #[test]
    fn test_buzz_caps_length() {
        let long = "word ".repeat(200);
        let summary = summarize(&long, SummaryMode::Buzz).summary;
        assert!(summary.chars().count() <= BUZZ_MAX_CHARS);
    }

    #[test]
    fn test_buzz_headline_capped_at_120() {
        let text = format!("{} end.", "headline".repeat(40));
        let summary = summarize(&text, SummaryMode::Buzz).summary;
        let headline = summary.split(" | ").next().unwrap();
        assert_eq!(headline.chars().count(), HEADLINE_MAX_CHARS);
    }

    #[test]
    fn test_fallback_buzzwords_takes_long_words() {
        assert_eq!(
            fallback_buzzwords("It is about rustaceans, borrowing and lifetimes today"),
            vec!["about", "rustaceans", "borrowing"]
        );
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Story".parse::<SummaryMode>(), Ok(SummaryMode::Story));
        assert!("poem".parse::<SummaryMode>().is_err());
        assert_eq!(SummaryMode::Buzz.to_string(), "buzz");
    }

    #[test]
    fn test_large_text_summarizes_in_bounded_time() {
        let text: String = (0..20_000)
            .map(|i| format!("Topic{} alpha{} beta gamma. ", i % 97, i % 13))
            .collect();
        let started = std::time::Instant::now();
        for mode in [SummaryMode::Beginner, SummaryMode::Story, SummaryMode::Buzz] {
            assert!(!summarize(&text, mode).summary.is_empty());
        }
        assert!(
            started.elapsed() < std::time::Duration::from_secs(20),
            "took {:?}",
            started.elapsed()
        );
    }
}

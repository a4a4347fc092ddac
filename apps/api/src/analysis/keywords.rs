//! Keyword Extractor — turns a job description into an ordered set of salient terms.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::tokenize;

/// Maximum number of keywords kept from a single job description.
pub const MAX_KEYWORDS: usize = 20;

/// Up to 20 unique lower-case keywords, in first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordSet(Vec<String>);

impl KeywordSet {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The first `n` keywords (fewer if the set is smaller).
    pub fn top(&self, n: usize) -> &[String] {
        &self.0[..n.min(self.0.len())]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

/// Extracts keywords from job-description text. Total: empty text yields an empty set.
pub fn extract_keywords(text: &str) -> KeywordSet {
    let mut seen = HashSet::new();
    let keywords = tokenize(text)
        .into_iter()
        .filter(|token| seen.insert(token.clone()))
        .take(MAX_KEYWORDS)
        .collect();
    KeywordSet(keywords)
}

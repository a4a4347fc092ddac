//! Graph ranking (TextRank) for sentences and keywords.
//!
//! Both rankers build a weighted undirected graph as adjacency lists and run damped
//! PageRank power iteration over it. Input is capped to a leading prefix so the cost
//! stays bounded. Failures are reported as `RankError` so callers can fall back.

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

use crate::analysis::tokenizer::tokenize;

const DAMPING: f64 = 0.85;
const MAX_ITERATIONS: usize = 50;
const TOLERANCE: f64 = 1e-6;
const COOCCURRENCE_WINDOW: usize = 4;
/// Sentences past this index are never ranked.
pub const MAX_RANKED_SENTENCES: usize = 500;
/// Tokens past this index are ignored by the keyword graph.
pub const MAX_RANKED_TOKENS: usize = 10_000;

/// Undirected weighted graph: `graph[i]` lists `(neighbour, weight)` with weight > 0.
type Graph = Vec<Vec<(usize, f64)>>;

#[derive(Debug, Error, PartialEq)]
pub enum RankError {
    #[error("nothing to rank")]
    Empty,

    #[error("ranking produced non-finite scores")]
    NonFinite,
}

/// Ranks the first `MAX_RANKED_SENTENCES` of `sentences` and returns the indices of the
/// top `count`, in reading order.
pub fn rank_sentences(sentences: &[String], count: usize) -> Result<Vec<usize>, RankError> {
    let considered = &sentences[..sentences.len().min(MAX_RANKED_SENTENCES)];
    let token_sets: Vec<HashSet<String>> = considered
        .iter()
        .map(|s| tokenize(s).into_iter().collect())
        .collect();
    if token_sets.iter().all(HashSet::is_empty) {
        return Err(RankError::Empty);
    }

    let n = considered.len();
    let mut graph: Graph = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            let similarity = sentence_similarity(&token_sets[i], &token_sets[j]);
            if similarity > 0.0 {
                graph[i].push((j, similarity));
                graph[j].push((i, similarity));
            }
        }
    }

    let scores = pagerank(&graph)?;
    let mut order = top_indices(&scores);
    order.truncate(count);
    order.sort_unstable();
    Ok(order)
}

/// Ranks content words of `text` by co-occurrence and returns the top `count`.
pub fn rank_keywords(text: &str, count: usize) -> Result<Vec<String>, RankError> {
    let mut tokens = tokenize(text);
    if tokens.is_empty() {
        return Err(RankError::Empty);
    }
    tokens.truncate(MAX_RANKED_TOKENS);

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut terms: Vec<&str> = Vec::new();
    for token in &tokens {
        index.entry(token.as_str()).or_insert_with(|| {
            terms.push(token.as_str());
            terms.len() - 1
        });
    }

    let mut edges: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (pos, token) in tokens.iter().enumerate() {
        let a = index[token.as_str()];
        for other in tokens.iter().skip(pos + 1).take(COOCCURRENCE_WINDOW - 1) {
            let b = index[other.as_str()];
            if a != b {
                *edges.entry((a.min(b), a.max(b))).or_insert(0.0) += 1.0;
            }
        }
    }

    let mut graph: Graph = vec![Vec::new(); terms.len()];
    for ((a, b), weight) in edges {
        graph[a].push((b, weight));
        graph[b].push((a, weight));
    }

    let scores = pagerank(&graph)?;
    Ok(top_indices(&scores)
        .into_iter()
        .take(count)
        .map(|i| terms[i].to_string())
        .collect())
}

/// Node indices by descending score, ties by index.
fn top_indices(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    order
}

/// Shared terms normalized by log sentence lengths.
fn sentence_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count() as f64;
    if shared == 0.0 {
        return 0.0;
    }
    let denominator = (a.len() as f64).ln() + (b.len() as f64).ln();
    if denominator <= 0.0 {
        // two single-term sentences sharing that term
        return shared;
    }
    shared / denominator
}

/// Weighted PageRank by power iteration, O(nodes + edges) per step.
/// Dangling nodes spread rank uniformly.
fn pagerank(graph: &Graph) -> Result<Vec<f64>, RankError> {
    let n = graph.len();
    if n == 0 {
        return Err(RankError::Empty);
    }
    let out_weight: Vec<f64> = graph
        .iter()
        .map(|edges| edges.iter().map(|(_, w)| w).sum())
        .collect();
    let base = (1.0 - DAMPING) / n as f64;
    let mut scores = vec![1.0 / n as f64; n];

    for _ in 0..MAX_ITERATIONS {
        let dangling: f64 = (0..n)
            .filter(|&j| out_weight[j] == 0.0)
            .map(|j| scores[j])
            .sum::<f64>()
            / n as f64;

        // symmetric graph: the edges out of i are also the edges into i
        let next: Vec<f64> = graph
            .iter()
            .map(|edges| {
                let inbound: f64 = edges
                    .iter()
                    .map(|&(j, w)| w / out_weight[j] * scores[j])
                    .sum();
                base + DAMPING * (inbound + dangling)
            })
            .collect();

        if next.iter().any(|s| !s.is_finite()) {
            return Err(RankError::NonFinite);
        }
        let delta: f64 = next.iter().zip(&scores).map(|(a, b)| (a - b).abs()).sum();
        scores = next;
        if delta < TOLERANCE {
            break;
        }
    }
    Ok(scores)
}

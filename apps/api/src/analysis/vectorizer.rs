//! Vectorizer — TF-IDF rows over a vocabulary shared by the whole batch.
//!
//! Vocabulary order is first occurrence across the batch, scanning documents in input
//! order, so identical input always yields identical columns.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::analysis::tokenizer::tokenize;

/// TF-IDF matrix for one batch: one row per input document, one column per term.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TermMatrix {
    pub vocabulary: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl TermMatrix {
    /// No document contributed a single term.
    pub fn has_no_features(&self) -> bool {
        self.vocabulary.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Builds L2-normalized TF-IDF rows for `documents`.
///
/// tf = count / document token count, idf = ln((1 + n) / (1 + df)) + 1.
/// Documents without terms produce all-zero rows.
pub fn vectorize<S: AsRef<str>>(documents: &[S]) -> TermMatrix {
    let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

    let mut vocabulary = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut doc_freq: Vec<usize> = Vec::new();

    for tokens in &tokenized {
        let mut seen_here = HashSet::new();
        for token in tokens {
            let column = *index.entry(token.clone()).or_insert_with(|| {
                vocabulary.push(token.clone());
                doc_freq.push(0);
                vocabulary.len() - 1
            });
            if seen_here.insert(column) {
                doc_freq[column] += 1;
            }
        }
    }

    let n_docs = documents.len() as f64;
    let idf: Vec<f64> = doc_freq
        .iter()
        .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
        .collect();

    let rows = tokenized
        .iter()
        .map(|tokens| {
            let mut row = vec![0.0; vocabulary.len()];
            if tokens.is_empty() {
                return row;
            }
            for token in tokens {
                row[index[token]] += 1.0;
            }
            let total = tokens.len() as f64;
            for (weight, idf) in row.iter_mut().zip(&idf) {
                *weight = *weight / total * idf;
            }
            let norm = row.iter().map(|w| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for weight in &mut row {
                    *weight /= norm;
                }
            }
            row
        })
        .collect();

    TermMatrix { vocabulary, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_is_first_occurrence_order() {
        let matrix = vectorize(&["rust systems", "python systems data"]);
        assert_eq!(matrix.vocabulary, vec!["rust", "systems", "python", "data"]);
    }

    #[test]
    fn test_one_row_per_document_aligned_to_vocabulary() {
        let matrix = vectorize(&["rust systems", "python data", ""]);
        assert_eq!(matrix.rows.len(), 3);
        assert!(matrix.rows.iter().all(|r| r.len() == matrix.dimension()));
    }

    #[test]
    fn test_absent_terms_are_zero() {
        let matrix = vectorize(&["rust systems", "python data"]);
        // "python" is column 2, absent in the first document
        assert_eq!(matrix.rows[0][2], 0.0);
        assert!(matrix.rows[1][2] > 0.0);
    }

    #[test]
    fn test_empty_document_yields_zero_row() {
        let matrix = vectorize(&["rust compiler", "   "]);
        assert!(matrix.rows[1].iter().all(|w| *w == 0.0));
    }

    #[test]
    fn test_rows_are_unit_length() {
        let matrix = vectorize(&["alpha beta beta gamma", "beta delta"]);
        for row in &matrix.rows {
            let norm = row.iter().map(|w| w * w).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9, "norm was {norm}");
        }
    }

    #[test]
    fn test_rarer_term_weighs_more() {
        // "shared" appears in both documents, "unique" only in the first
        let matrix = vectorize(&["shared unique", "shared other"]);
        let shared = matrix.vocabulary.iter().position(|t| t == "shared").unwrap();
        let unique = matrix.vocabulary.iter().position(|t| t == "unique").unwrap();
        assert!(matrix.rows[0][unique] > matrix.rows[0][shared]);
    }

    #[test]
    fn test_all_empty_documents_have_no_features() {
        let matrix = vectorize(&["", "a an", "!!"]);
        assert!(matrix.has_no_features());
        assert_eq!(matrix.rows, vec![Vec::<f64>::new(); 3]);
    }

    #[test]
    fn test_vectorize_is_deterministic() {
        let docs = ["graph neural networks", "neural machine translation", "graph search"];
        let a = vectorize(&docs);
        let b = vectorize(&docs);
        assert_eq!(a.vocabulary, b.vocabulary);
        assert_eq!(a.rows, b.rows);
    }
}

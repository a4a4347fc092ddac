//! Clusterer — groups TF-IDF rows with deterministic k-means and labels each group.
//!
//! Seeding is farthest-point (no randomness), assignment is nearest centroid by
//! Euclidean distance. Every input id lands in exactly one returned cluster.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::vectorizer::{vectorize, TermMatrix};

pub const SINGLE_CLUSTER_LABEL: &str = "All documents";
pub const NO_FEATURES_LABEL: &str = "No extractable features";

const MAX_ITERATIONS: usize = 100;
const LABEL_TERMS: usize = 3;

/// One input document for clustering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

/// A labeled group of document ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub label: String,
    pub items: Vec<String>,
}

/// Vectorizes and clusters `documents` into at most `k` groups.
///
/// Empty input yields no clusters; callers reject that before getting here.
pub fn cluster_documents(documents: &[Document], k: usize) -> Vec<Cluster> {
    if documents.is_empty() {
        return Vec::new();
    }
    let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
    let matrix = vectorize(&texts);
    let ids: Vec<String> = documents.iter().map(|d| d.id.clone()).collect();
    cluster_matrix(&ids, &matrix, k)
}

/// Clusters precomputed rows. `ids` and `matrix.rows` must be index-aligned.
pub fn cluster_matrix(ids: &[String], matrix: &TermMatrix, k: usize) -> Vec<Cluster> {
    if ids.is_empty() {
        return Vec::new();
    }

    let k = k.min(ids.len());
    if ids.len() <= 1 || k <= 1 {
        return vec![single_cluster(ids, SINGLE_CLUSTER_LABEL)];
    }

    if matrix.has_no_features() {
        return vec![single_cluster(ids, NO_FEATURES_LABEL)];
    }

    match kmeans(&matrix.rows, k) {
        Some(partition) => label_partition(ids, matrix, partition),
        None => {
            warn!(
                "k-means degenerated for {} documents (k={k}), returning a single cluster",
                ids.len()
            );
            vec![single_cluster(ids, SINGLE_CLUSTER_LABEL)]
        }
    }
}

fn single_cluster(ids: &[String], label: &str) -> Cluster {
    Cluster {
        label: label.to_string(),
        items: ids.to_vec(),
    }
}

/// Result of a k-means run: per-row cluster index plus final centroids.
struct Partition {
    assignments: Vec<usize>,
    centroids: Vec<Vec<f64>>,
}

/// Runs Lloyd's algorithm. Returns `None` if the centroids become non-finite.
fn kmeans(rows: &[Vec<f64>], k: usize) -> Option<Partition> {
    let mut centroids = seed_centroids(rows, k);
    if centroids.is_empty() {
        return None;
    }

    let mut assignments = assign(rows, &centroids);
    for iteration in 0..MAX_ITERATIONS {
        update_centroids(rows, &assignments, &mut centroids);
        if centroids.iter().flatten().any(|w| !w.is_finite()) {
            return None;
        }
        let next = assign(rows, &centroids);
        if next == assignments {
            debug!("k-means converged after {} iterations", iteration + 1);
            break;
        }
        assignments = next;
    }

    Some(Partition {
        assignments,
        centroids,
    })
}

/// Farthest-point seeding: first non-zero row, then repeatedly the row farthest from
/// its nearest seed. Stops early once every row coincides with a seed.
fn seed_centroids(rows: &[Vec<f64>], k: usize) -> Vec<Vec<f64>> {
    let first = rows
        .iter()
        .position(|row| row.iter().any(|w| *w != 0.0))
        .unwrap_or(0);
    let mut centroids = vec![rows[first].clone()];

    while centroids.len() < k {
        let mut best: Option<(usize, f64)> = None;
        for (i, row) in rows.iter().enumerate() {
            let nearest = centroids
                .iter()
                .map(|c| squared_distance(row, c))
                .fold(f64::INFINITY, f64::min);
            if best.map_or(true, |(_, d)| nearest > d) {
                best = Some((i, nearest));
            }
        }
        match best {
            Some((i, d)) if d > 0.0 => centroids.push(rows[i].clone()),
            _ => break,
        }
    }
    centroids
}

fn assign(rows: &[Vec<f64>], centroids: &[Vec<f64>]) -> Vec<usize> {
    rows.iter()
        .map(|row| {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (c, centroid) in centroids.iter().enumerate() {
                let d = squared_distance(row, centroid);
                if d < best_distance {
                    best = c;
                    best_distance = d;
                }
            }
            best
        })
        .collect()
}

/// Moves each centroid to the mean of its members. Empty clusters keep their centroid.
fn update_centroids(rows: &[Vec<f64>], assignments: &[usize], centroids: &mut [Vec<f64>]) {
    let dimension = rows.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; dimension]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];

    for (row, &cluster) in rows.iter().zip(assignments) {
        counts[cluster] += 1;
        for (sum, w) in sums[cluster].iter_mut().zip(row) {
            *sum += w;
        }
    }

    for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
        if count > 0 {
            *centroid = sum.into_iter().map(|s| s / count as f64).collect();
        }
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Groups ids by assignment and names each non-empty group from its centroid.
fn label_partition(ids: &[String], matrix: &TermMatrix, partition: Partition) -> Vec<Cluster> {
    let mut members: Vec<Vec<String>> = vec![Vec::new(); partition.centroids.len()];
    for (id, &cluster) in ids.iter().zip(&partition.assignments) {
        members[cluster].push(id.clone());
    }

    members
        .into_iter()
        .zip(&partition.centroids)
        .enumerate()
        .filter(|(_, (items, _))| !items.is_empty())
        .map(|(i, (items, centroid))| Cluster {
            label: centroid_label(&matrix.vocabulary, centroid)
                .unwrap_or_else(|| format!("Cluster {}", i + 1)),
            items,
        })
        .collect()
}

/// Comma-joined top terms by centroid weight, or `None` if no term has weight.
fn centroid_label(vocabulary: &[String], centroid: &[f64]) -> Option<String> {
    let mut weighted: Vec<(usize, f64)> = centroid
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, w)| *w > 0.0)
        .collect();
    if weighted.is_empty() {
        return None;
    }
    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Some(
        weighted
            .iter()
            .take(LABEL_TERMS)
            .filter_map(|(i, _)| vocabulary.get(*i).map(String::as_str))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

//! Axum route handlers for the text analysis API (keywords, clustering, summaries).

use std::collections::HashSet;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::clustering::{cluster_documents, Cluster, Document};
use crate::analysis::keywords::{extract_keywords, KeywordSet};
use crate::analysis::summarizer::{summarize, SummaryMode, SummaryResult};
use crate::errors::AppError;
use crate::state::AppState;

/// Largest batch `/api/v1/cluster` accepts.
pub const MAX_DOCUMENTS: usize = 200;
/// Combined text length of a batch, in characters.
pub const MAX_BATCH_CHARS: usize = 200_000;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct KeywordsRequest {
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct KeywordsResponse {
    pub keywords: KeywordSet,
}

#[derive(Debug, Deserialize)]
pub struct ClusterRequest {
    pub documents: Vec<Document>,
    /// Defaults to `DEFAULT_CLUSTER_COUNT`.
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ClusterResponse {
    pub clusters: Vec<Cluster>,
}

/// `mode` is taken as a string so unknown modes surface as validation errors.
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
    pub mode: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/keywords
///
/// Extracts up to 20 keywords from a job description. Blank text yields an empty list.
pub async fn handle_extract_keywords(
    Json(request): Json<KeywordsRequest>,
) -> Json<KeywordsResponse> {
    Json(KeywordsResponse {
        keywords: extract_keywords(&request.job_description),
    })
}

/// POST /api/v1/cluster
///
/// Clusters a batch of documents. Every id appears in exactly one returned cluster.
pub async fn handle_cluster(
    State(state): State<AppState>,
    Json(request): Json<ClusterRequest>,
) -> Result<Json<ClusterResponse>, AppError> {
    validate_documents(&request.documents)?;
    let k = resolve_k(request.k, state.config.default_cluster_count)?;

    let clusters = cluster_blocking(request.documents, k).await?;
    Ok(Json(ClusterResponse { clusters }))
}

/// POST /api/v1/summarize
pub async fn handle_summarize(
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummaryResult>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }
    let mode: SummaryMode = request.mode.parse().map_err(AppError::Validation)?;

    let result = tokio::task::spawn_blocking(move || summarize(&request.text, mode))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Summarize task failed: {e}")))?;
    Ok(Json(result))
}

// ────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ────────────────────────────────────────────────────────────────────────────

/// Rejects empty or oversized batches, blank ids and duplicate ids.
pub(crate) fn validate_documents(documents: &[Document]) -> Result<(), AppError> {
    if documents.is_empty() {
        return Err(AppError::Validation(
            "documents must contain at least one entry".to_string(),
        ));
    }
    if documents.len() > MAX_DOCUMENTS {
        return Err(AppError::Validation(format!(
            "at most {MAX_DOCUMENTS} documents can be clustered at once"
        )));
    }
    let total_chars: usize = documents.iter().map(|d| d.text.chars().count()).sum();
    if total_chars > MAX_BATCH_CHARS {
        return Err(AppError::Validation(format!(
            "documents may hold at most {MAX_BATCH_CHARS} characters of text in total"
        )));
    }
    let mut seen = HashSet::with_capacity(documents.len());
    for doc in documents {
        if doc.id.trim().is_empty() {
            return Err(AppError::Validation("document id cannot be empty".to_string()));
        }
        if !seen.insert(doc.id.as_str()) {
            return Err(AppError::Validation(format!(
                "duplicate document id '{}'",
                doc.id
            )));
        }
    }
    Ok(())
}

pub(crate) fn resolve_k(requested: Option<usize>, default: usize) -> Result<usize, AppError> {
    match requested {
        Some(0) => Err(AppError::Validation("k must be at least 1".to_string())),
        Some(k) => Ok(k),
        None => Ok(default),
    }
}

/// Runs k-means off the async runtime.
pub(crate) async fn cluster_blocking(
    documents: Vec<Document>,
    k: usize,
) -> Result<Vec<Cluster>, AppError> {
    let count = documents.len();
    let clusters = tokio::task::spawn_blocking(move || cluster_documents(&documents, k))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Clustering task failed: {e}")))?;

    info!(
        "Clustered {} documents into {} groups (k = {})",
        count,
        clusters.len(),
        k
    );
    Ok(clusters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, text: &str) -> Document {
        Document {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_validate_documents() {
        assert!(validate_documents(&[]).is_err());
        assert!(validate_documents(&[doc(" ", "text")]).is_err());
        assert!(validate_documents(&[doc("a", "x"), doc("a", "y")]).is_err());
        assert!(validate_documents(&[doc("a", ""), doc("b", "y")]).is_ok());
    }

    #[test]
    fn test_validate_documents_rejects_oversized_batches() {
        let many: Vec<Document> = (0..=MAX_DOCUMENTS)
            .map(|i| doc(&i.to_string(), "text"))
            .collect();
        assert!(matches!(validate_documents(&many), Err(AppError::Validation(_))));
        assert!(validate_documents(&many[..MAX_DOCUMENTS]).is_ok());

        let huge = "word ".repeat(MAX_BATCH_CHARS / 5 + 1);
        assert!(matches!(
            validate_documents(&[doc("a", &huge)]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_resolve_k() {
        assert!(matches!(resolve_k(Some(0), 3), Err(AppError::Validation(_))));
        assert_eq!(resolve_k(Some(5), 3).unwrap(), 5);
        assert_eq!(resolve_k(None, 3).unwrap(), 3);
    }

    #[tokio::test]
    async fn test_cluster_blocking_covers_every_id() {
        let docs = vec![
            doc("1", "rust ownership borrowing lifetimes"),
            doc("2", "rust borrowing checker lifetimes"),
            doc("3", "sourdough bread baking flour"),
        ];
        let clusters = cluster_blocking(docs, 2).await.unwrap();
        let mut ids: Vec<String> = clusters.into_iter().flat_map(|c| c.items).collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }
}

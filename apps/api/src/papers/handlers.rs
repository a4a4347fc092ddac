//! Axum route handlers for the Papers API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::analysis::clustering::{Cluster, Document};
use crate::analysis::handlers::{cluster_blocking, resolve_k};
use crate::errors::AppError;
use crate::papers::{self, Paper, PaperSource};
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Query parameters arrive as strings so bad values become validation errors
/// instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub source: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub source: PaperSource,
    pub papers: Vec<Paper>,
}

#[derive(Debug, Deserialize)]
pub struct ClusterPapersRequest {
    pub query: String,
    #[serde(default)]
    pub source: PaperSource,
    pub limit: Option<usize>,
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ClusterPapersResponse {
    pub clusters: Vec<Cluster>,
    pub papers: Vec<Paper>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/papers/search?query=&source=&limit=
pub async fn handle_search_papers(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = require_query(params.query.as_deref())?;
    let source = match params.source.as_deref().map(str::trim) {
        None | Some("") => PaperSource::default(),
        Some(raw) => raw.parse().map_err(AppError::Validation)?,
    };
    let limit = parse_limit(params.limit.as_deref())?;

    let papers = fetch(&state, source, query, limit).await?;
    Ok(Json(SearchResponse { source, papers }))
}

/// POST /api/v1/papers/cluster
///
/// Searches, then clusters the results by title and abstract. Cluster items are paper ids.
pub async fn handle_cluster_papers(
    State(state): State<AppState>,
    Json(request): Json<ClusterPapersRequest>,
) -> Result<Json<ClusterPapersResponse>, AppError> {
    let query = require_query(Some(&request.query))?;
    let limit = check_limit(request.limit.unwrap_or(DEFAULT_LIMIT))?;
    let k = resolve_k(request.k, state.config.default_cluster_count)?;

    let mut papers = fetch(&state, request.source, query, limit).await?;
    // a source may repeat an entry; ids must be unique for the cluster cover
    let mut seen = std::collections::HashSet::new();
    papers.retain(|p| seen.insert(p.id.clone()));

    let documents: Vec<Document> = papers
        .iter()
        .map(|p| Document {
            id: p.id.clone(),
            text: p.cluster_text(),
        })
        .collect();
    let clusters = cluster_blocking(documents, k).await?;

    Ok(Json(ClusterPapersResponse { clusters, papers }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn fetch(
    state: &AppState,
    source: PaperSource,
    query: &str,
    limit: usize,
) -> Result<Vec<Paper>, AppError> {
    papers::search(&state.http, &state.config, source, query, limit)
        .await
        .map_err(|e| AppError::Upstream(format!("{source} search failed: {e:#}")))
}

fn require_query(query: Option<&str>) -> Result<&str, AppError> {
    match query.map(str::trim) {
        Some(q) if !q.is_empty() => Ok(q),
        _ => Err(AppError::Validation("query cannot be empty".to_string())),
    }
}

/// Absent → 10; otherwise an integer in 1..=50.
fn parse_limit(raw: Option<&str>) -> Result<usize, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(DEFAULT_LIMIT);
    };
    let limit = raw
        .parse::<usize>()
        .map_err(|_| AppError::Validation(format!("limit must be an integer, got '{raw}'")))?;
    check_limit(limit)
}

fn check_limit(limit: usize) -> Result<usize, AppError> {
    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None).unwrap(), DEFAULT_LIMIT);
        assert_eq!(parse_limit(Some("")).unwrap(), DEFAULT_LIMIT);
        assert_eq!(parse_limit(Some(" 25 ")).unwrap(), 25);
        assert_eq!(parse_limit(Some("50")).unwrap(), 50);
        assert!(matches!(parse_limit(Some("ten")), Err(AppError::Validation(_))));
        assert!(matches!(parse_limit(Some("0")), Err(AppError::Validation(_))));
        assert!(matches!(parse_limit(Some("51")), Err(AppError::Validation(_))));
        assert!(matches!(parse_limit(Some("-3")), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_require_query() {
        assert_eq!(require_query(Some("  rust ")).unwrap(), "rust");
        assert!(require_query(Some("   ")).is_err());
        assert!(require_query(None).is_err());
    }
}

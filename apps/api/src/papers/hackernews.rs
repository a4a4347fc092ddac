//! Hacker News search through the Algolia API.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::papers::{Paper, PaperSource};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "objectID")]
    object_id: String,
    title: Option<String>,
    url: Option<String>,
    author: Option<String>,
    created_at: Option<String>,
    story_text: Option<String>,
}

pub async fn search(
    client: &reqwest::Client,
    api_url: &str,
    query: &str,
    limit: usize,
) -> Result<Vec<Paper>> {
    let hits_per_page = limit.to_string();

    info!("Searching Hacker News for '{}' (limit {})", query, limit);
    let body = client
        .get(api_url)
        .query(&[
            ("query", query),
            ("tags", "story"),
            ("hitsPerPage", hits_per_page.as_str()),
        ])
        .send()
        .await
        .context("Hacker News request failed")?
        .error_for_status()
        .context("Hacker News returned an error status")?
        .text()
        .await
        .context("Failed to read Hacker News response")?;

    let mut papers = parse_hits(&body)?;
    papers.truncate(limit);
    info!("Hacker News returned {} stories", papers.len());
    Ok(papers)
}

/// Hits without a title are dropped.
pub fn parse_hits(body: &str) -> Result<Vec<Paper>> {
    let response: SearchResponse =
        serde_json::from_str(body).context("Malformed Hacker News response")?;

    Ok(response
        .hits
        .into_iter()
        .filter_map(|hit| {
            let title = hit.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
            let url = hit.url.filter(|u| !u.is_empty()).or_else(|| {
                Some(format!(
                    "https://news.ycombinator.com/item?id={}",
                    hit.object_id
                ))
            });
            Some(Paper {
                id: hit.object_id,
                title,
                summary: hit.story_text.unwrap_or_default().trim().to_string(),
                authors: hit.author.into_iter().collect(),
                published: hit.created_at,
                url,
                source: PaperSource::Hackernews,
            })
        })
        .collect())
}

//! Paper search over external sources (arXiv, Hacker News).

pub mod arxiv;
pub mod handlers;
pub mod hackernews;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSource {
    #[default]
    Arxiv,
    Hackernews,
}

impl fmt::Display for PaperSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperSource::Arxiv => f.write_str("arxiv"),
            PaperSource::Hackernews => f.write_str("hackernews"),
        }
    }
}

impl FromStr for PaperSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arxiv" => Ok(PaperSource::Arxiv),
            "hackernews" | "hn" => Ok(PaperSource::Hackernews),
            other => Err(format!(
                "unknown source '{other}' (expected arxiv or hackernews)"
            )),
        }
    }
}

/// A search result, normalized across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: String,
    pub title: String,
    /// Abstract for arXiv, story text (often empty) for Hacker News.
    pub summary: String,
    pub authors: Vec<String>,
    pub published: Option<String>,
    pub url: Option<String>,
    pub source: PaperSource,
}

impl Paper {
    /// Text fed to the clusterer.
    pub fn cluster_text(&self) -> String {
        if self.summary.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.summary)
        }
    }
}

/// Dispatches a search to the client for `source`.
pub async fn search(
    client: &reqwest::Client,
    config: &crate::config::Config,
    source: PaperSource,
    query: &str,
    limit: usize,
) -> anyhow::Result<Vec<Paper>> {
    match source {
        PaperSource::Arxiv => arxiv::search(client, &config.arxiv_api_url, query, limit).await,
        PaperSource::Hackernews => {
            hackernews::search(client, &config.hn_api_url, query, limit).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parsing() {
        assert_eq!("arXiv".parse::<PaperSource>(), Ok(PaperSource::Arxiv));
        assert_eq!("hn".parse::<PaperSource>(), Ok(PaperSource::Hackernews));
        assert!("scholar".parse::<PaperSource>().is_err());
    }

    #[test]
    fn test_cluster_text_falls_back_to_title() {
        let paper = Paper {
            id: "1".to_string(),
            title: "Show HN: a tiny database".to_string(),
            summary: String::new(),
            authors: vec![],
            published: None,
            url: None,
            source: PaperSource::Hackernews,
        };
        assert_eq!(paper.cluster_text(), "Show HN: a tiny database");
    }
}

//! arXiv search client — queries the Atom API and parses entries with quick-xml events.

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::info;

use crate::papers::{Paper, PaperSource};

/// Fetches up to `limit` papers matching `query`.
pub async fn search(
    client: &reqwest::Client,
    api_url: &str,
    query: &str,
    limit: usize,
) -> Result<Vec<Paper>> {
    let search_query = format!("all:{query}");
    let max_results = limit.to_string();

    info!("Searching arXiv for '{}' (limit {})", query, limit);
    let xml = client
        .get(api_url)
        .query(&[
            ("search_query", search_query.as_str()),
            ("start", "0"),
            ("max_results", max_results.as_str()),
        ])
        .send()
        .await
        .context("arXiv request failed")?
        .error_for_status()
        .context("arXiv returned an error status")?
        .text()
        .await
        .context("Failed to read arXiv response")?;

    let mut papers = parse_feed(&xml)?;
    papers.truncate(limit);
    info!("arXiv returned {} papers", papers.len());
    Ok(papers)
}

#[derive(Clone, Copy)]
enum Field {
    Id,
    Title,
    Summary,
    Published,
    AuthorName,
}

/// Parses an Atom feed into papers. Entries without an id are skipped.
pub fn parse_feed(xml: &str) -> Result<Vec<Paper>> {
    let mut reader = Reader::from_str(xml);
    let mut papers = Vec::new();
    let mut current: Option<Paper> = None;
    let mut in_author = false;
    let mut field: Option<Field> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"entry" => current = Some(empty_paper()),
                b"author" if current.is_some() => in_author = true,
                b"name" if in_author => field = Some(Field::AuthorName),
                b"id" if current.is_some() => field = Some(Field::Id),
                b"title" if current.is_some() => field = Some(Field::Title),
                b"summary" if current.is_some() => field = Some(Field::Summary),
                b"published" if current.is_some() => field = Some(Field::Published),
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"link" => {
                if let Some(paper) = current.as_mut() {
                    let mut href = None;
                    let mut is_alternate = false;
                    for attr in e.attributes().flatten() {
                        match attr.key.local_name().as_ref() {
                            b"href" => href = Some(attr.unescape_value()?.to_string()),
                            b"rel" => is_alternate = attr.value.as_ref() == b"alternate",
                            _ => {}
                        }
                    }
                    if is_alternate && paper.url.is_none() {
                        paper.url = href;
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let (Some(f), Some(paper)) = (field, current.as_mut()) {
                    let text = e.unescape()?;
                    match f {
                        Field::Id => paper.id.push_str(&text),
                        Field::Title => paper.title.push_str(&text),
                        Field::Summary => paper.summary.push_str(&text),
                        Field::Published => paper
                            .published
                            .get_or_insert_with(String::new)
                            .push_str(&text),
                        Field::AuthorName => paper.authors.push(text.trim().to_string()),
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"entry" => {
                    if let Some(paper) = current.take() {
                        if !paper.id.trim().is_empty() {
                            papers.push(normalize(paper));
                        }
                    }
                    in_author = false;
                    field = None;
                }
                b"author" => in_author = false,
                _ => field = None,
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e).context("Malformed arXiv feed"),
            _ => {}
        }
        buf.clear();
    }

    Ok(papers)
}

fn empty_paper() -> Paper {
    Paper {
        id: String::new(),
        title: String::new(),
        summary: String::new(),
        authors: Vec::new(),
        published: None,
        url: None,
        source: PaperSource::Arxiv,
    }
}

/// Collapses the line-wrapped whitespace arXiv puts in titles and abstracts.
fn normalize(mut paper: Paper) -> Paper {
    let squash = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
    paper.id = paper.id.trim().to_string();
    paper.title = squash(&paper.title);
    paper.summary = squash(&paper.summary);
    paper.published = paper.published.map(|p| p.trim().to_string());
    if paper.url.is_none() {
        paper.url = Some(paper.id.clone());
    }
    paper
}

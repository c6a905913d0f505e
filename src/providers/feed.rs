//! RSS / Atom feed client
//!
//! Polls one feed and returns the entries published after a cutoff.
//! Parsing is done by feed-rs, which handles RSS 0.9x/1.0/2.0 and Atom.

use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use scraper::Html;
use tracing::{debug, info};

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{Article, FeedSource};
use crate::providers::http::HttpTransport;
use crate::utils::constants::DESCRIPTION_MAX_CHARS;
use crate::utils::text::truncate_chars;

pub struct FeedClient {
    http: HttpTransport,
}

impl FeedClient {
    pub fn new(http: HttpTransport) -> Self {
        Self { http }
    }

    /// Entries of `source` published strictly after `cutoff`
    pub async fn fetch_recent(
        &self,
        source: &FeedSource,
        cutoff: DateTime<Utc>,
    ) -> AppResult<Vec<Article>> {
        let response = self
            .http
            .get(&source.url)
            .await
            .map_err(|e| AppError::feed_fetch(format!("{}: {}", source.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::feed_fetch(format!(
                "{} returned HTTP {}",
                source.url, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::feed_fetch(format!("{}: {}", source.url, e)))?;

        let articles = parse_feed(&body, source, cutoff)?;
        info!(
            "📰 {} [{}]: {} recent entries",
            source.url,
            source.category,
            articles.len()
        );
        Ok(articles)
    }
}

/// Parse a feed document and keep the recent, well-formed entries
pub fn parse_feed(
    body: &[u8],
    source: &FeedSource,
    cutoff: DateTime<Utc>,
) -> AppResult<Vec<Article>> {
    let feed = feed_rs::parser::parse(body)
        .map_err(|e| AppError::feed_parse(format!("{}: {}", source.url, e)))?;

    let feed_title = feed
        .title
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| source.url.clone());

    let mut articles = Vec::new();
    for entry in feed.entries {
        let Some(published) = entry.published.or(entry.updated) else {
            debug!("Skipping entry without date in {}", source.url);
            continue;
        };
        if published <= cutoff {
            continue;
        }
        let Some(url) = entry_link(&entry) else {
            debug!("Skipping entry without link in {}", source.url);
            continue;
        };

        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());

        let description = entry
            .summary
            .as_ref()
            .map(|s| strip_markup(&s.content))
            .unwrap_or_default();

        articles.push(Article {
            title,
            url,
            published,
            source: feed_title.clone(),
            description: truncate_chars(&description, DESCRIPTION_MAX_CHARS).to_string(),
            category: source.category.clone(),
        });
    }

    Ok(articles)
}

/// First alternate link, else the first link of any kind
fn entry_link(entry: &Entry) -> Option<String> {
    entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
        .or_else(|| entry.links.first())
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty())
}

/// Feed summaries often carry HTML; keep only the text, whitespace collapsed
fn strip_markup(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

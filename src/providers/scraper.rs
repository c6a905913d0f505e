//! Article page scraper
//!
//! Fetches the article with a browser User-Agent and pulls out the main
//! body text. Chrome (scripts, navigation, headers, footers, ads) never
//! contributes text.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::providers::http::HttpTransport;
use crate::utils::constants::{
    BLOCK_ELEMENTS, CONTENT_SELECTORS, SCRAPED_CONTENT_MAX_CHARS, SCRAPED_LINE_MIN_CHARS,
    STRIPPED_ELEMENTS,
};
use crate::utils::text::truncate_chars;

pub struct ArticleScraper {
    http: HttpTransport,
}

impl ArticleScraper {
    pub fn new(http: HttpTransport) -> Self {
        Self { http }
    }

    /// Cleaned body text of the page, at most 4000 characters.
    /// Network errors, non-2xx statuses and pages without text are errors.
    pub async fn scrape(&self, url: &str) -> AppResult<String> {
        let response = self
            .http
            .get(url)
            .await
            .map_err(|e| AppError::scrape_failed(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::scrape_failed(format!("{} returned HTTP {}", url, status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AppError::scrape_failed(format!("{}: {}", url, e)))?;

        let content = extract_content(&html);
        if content.is_empty() {
            warn!("⚠️ No readable text at {}", url);
            return Err(AppError::new(
                ErrorCode::ScrapeEmpty,
                format!("No readable text at {}", url),
            ));
        }
        debug!("📄 Scraped {} chars from {}", content.chars().count(), url);
        Ok(content)
    }
}

/// Main text of an HTML document.
///
/// The first selector with any match wins; among its matches the element
/// with the most text is used (first on ties). Falls back to the whole
/// document when nothing matches or the match has no text.
pub fn extract_content(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut content = String::new();
    for raw in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let mut best: Option<(usize, String)> = None;
        for element in document.select(&selector).filter(|e| !inside_stripped(e)) {
            let text = element_text(element);
            let len = text.chars().count();
            if best.as_ref().map_or(true, |(best_len, _)| len > *best_len) {
                best = Some((len, text));
            }
        }
        if let Some((_, text)) = best {
            content = text;
            break;
        }
    }

    if content.trim().is_empty() {
        content = element_text(document.root_element());
    }

    clean_lines(&content)
}

/// Trim lines, drop short ones, cap the total length
fn clean_lines(content: &str) -> String {
    let joined = content
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > SCRAPED_LINE_MIN_CHARS)
        .collect::<Vec<_>>()
        .join("\n");
    truncate_chars(&joined, SCRAPED_CONTENT_MAX_CHARS).to_string()
}

fn is_stripped(name: &str) -> bool {
    STRIPPED_ELEMENTS.contains(&name)
}

fn inside_stripped(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(|node| node.value().as_element())
        .any(|el| is_stripped(el.name()))
}

fn element_text(element: ElementRef) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out
}

/// Depth-first text walk; block elements end with a newline
fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if is_stripped(name) {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
                if BLOCK_ELEMENTS.contains(&name) {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

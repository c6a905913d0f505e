//! Notion pages client
//!
//! One page per summarized article in the target database. Property names
//! (Title, URL, Source, Published, Summary, Category) must exist in the
//! database schema.

use reqwest::header::HeaderValue;
use serde_json::json;
use tracing::{debug, warn};

use crate::models::config::Secret;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::SummarizedArticle;
use crate::providers::http::HttpTransport;
use crate::providers::llm::bearer_headers;
use crate::utils::constants::{NOTION_TEXT_MAX_CHARS, NOTION_VERSION};
use crate::utils::text::truncate_chars;

pub struct NotionClient {
    http: HttpTransport,
    pages_url: String,
    token: Secret,
    database_id: String,
}

impl NotionClient {
    /// `base_url` is the API root, e.g. `https://api.notion.com`
    pub fn new(http: HttpTransport, base_url: &str, token: Secret, database_id: String) -> Self {
        Self {
            http,
            pages_url: format!("{}/v1/pages", base_url.trim_end_matches('/')),
            token,
            database_id,
        }
    }

    /// Create the page. Only HTTP 200 counts as success.
    pub async fn create_page(&self, item: &SummarizedArticle) -> AppResult<()> {
        let mut headers = bearer_headers(&self.token)?;
        headers.insert("Notion-Version", HeaderValue::from_static(NOTION_VERSION));

        let body = page_payload(&self.database_id, item);
        let response = self
            .http
            .post_json(&self.pages_url, headers, &body)
            .await
            .map_err(|e| {
                AppError::new(
                    ErrorCode::NotionRequestFailed,
                    format!("Notion request failed: {}", e),
                )
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!("❌ Notion rejected '{}': HTTP {}", item.article.title, status);
            return Err(AppError::notion_rejected(status, body));
        }

        debug!("📝 Notion page created for {}", item.article.url);
        Ok(())
    }
}

/// Request body for `POST /v1/pages`
pub fn page_payload(database_id: &str, item: &SummarizedArticle) -> serde_json::Value {
    let article = &item.article;
    let text = |s: &str| truncate_chars(s, NOTION_TEXT_MAX_CHARS).to_string();

    json!({
        "parent": { "database_id": database_id },
        "properties": {
            "Title": {
                "title": [{ "text": { "content": text(&article.title) } }]
            },
            "URL": {
                "url": article.url
            },
            "Source": {
                "rich_text": [{ "text": { "content": text(&article.source) } }]
            },
            "Published": {
                "date": { "start": article.published.to_rfc3339() }
            },
            "Summary": {
                "rich_text": [{ "text": { "content": text(&item.summary.text) } }]
            },
            "Category": {
                "select": { "name": article.category }
            }
        }
    })
}

//! Type definitions for the aggregation pipeline
//! Articles, summaries and per-run reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One feed to poll, tagged with the category it is published under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub category: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(category: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            url: url.into(),
        }
    }
}

/// A recent feed entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub published: DateTime<Utc>,
    /// Feed title (falls back to the feed URL)
    pub source: String,
    /// Feed-provided teaser, markup stripped, at most 200 chars
    pub description: String,
    pub category: String,
}

/// Which provider produced a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    Groq,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "huggingface")]
    HuggingFace,
    Extractive,
}

impl SummarySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummarySource::Groq => "groq",
            SummarySource::OpenAi => "openai",
            SummarySource::HuggingFace => "huggingface",
            SummarySource::Extractive => "extractive",
        }
    }
}

/// Bullet summary text plus the provider that wrote it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    pub source: SummarySource,
}

/// Article ready for publishing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizedArticle {
    pub article: Article,
    pub summary: Summary,
}

/// What started a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    /// Cron tick from the in-process scheduler
    Schedule,
    /// Manual dispatch through the API
    Dispatch,
    /// One-shot binary invocation (CI job)
    Cli,
}

impl RunTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunTrigger::Schedule => "schedule",
            RunTrigger::Dispatch => "dispatch",
            RunTrigger::Cli => "cli",
        }
    }
}

/// Outcome of one aggregation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub trigger: RunTrigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub feeds_polled: u64,
    pub feed_errors: u64,
    pub articles_found: u64,
    pub duplicates_skipped: u64,
    pub scrape_failures: u64,
    pub summarized: u64,
    pub summaries_by_source: HashMap<String, u64>,
    pub published: u64,
    pub publish_failures: u64,
}

impl RunReport {
    pub fn new(run_id: Uuid, trigger: RunTrigger, dry_run: bool) -> Self {
        Self {
            run_id,
            trigger,
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            feeds_polled: 0,
            feed_errors: 0,
            articles_found: 0,
            duplicates_skipped: 0,
            scrape_failures: 0,
            summarized: 0,
            summaries_by_source: HashMap::new(),
            published: 0,
            publish_failures: 0,
        }
    }

    pub fn record_summary(&mut self, source: SummarySource) {
        self.summarized += 1;
        *self
            .summaries_by_source
            .entry(source.as_str().to_string())
            .or_insert(0) += 1;
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }

    /// Summaries existed but none reached Notion
    pub fn is_failure(&self) -> bool {
        !self.dry_run && self.summarized > 0 && self.published == 0
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "Run {} ({}) | Feeds: {} ({} errors) | Found: {} | Dupes: {} | Summarized: {} | Published: {}/{}",
            self.run_id,
            self.trigger.as_str(),
            self.feeds_polled,
            self.feed_errors,
            self.articles_found,
            self.duplicates_skipped,
            self.summarized,
            self.published,
            self.published + self.publish_failures,
        )
    }
}

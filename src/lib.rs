//! Article Aggregator Library
//!
//! Daily digest of tech and health news:
//! - Polls RSS/Atom feeds for entries from the last 24 hours
//! - Scrapes each article and summarizes it into 3-4 bullets
//!   (Groq -> OpenAI -> HuggingFace -> extractive fallback)
//! - Publishes one Notion page per article
//!
//! Runs once per invocation (`article_aggregator`, driven by the CI cron)
//! or as a daemon with its own scheduler and dispatch API (`aggregator_api`).

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod telemetry;
pub mod utils;

pub use crate::core::{run_scheduler, ArticleAggregator, PromptStyle, RunPermit, SummaryChain};
pub use models::config::{AggregatorConfig, FileConfig, RetryPolicy, Secret, Secrets};
pub use models::errors::{AppError, AppResult, ErrorCode};
pub use models::types::{
    Article, FeedSource, RunReport, RunTrigger, SummarizedArticle, Summary, SummarySource,
};
pub use telemetry::{RunTelemetry, TelemetryStats};

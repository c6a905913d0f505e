//! Aggregation run
//!
//! Phase 1 walks every feed, scrapes and summarizes the recent entries.
//! Phase 2 publishes the summaries to Notion. Both phases are sequential
//! and paced by the configured delays, matching the providers' free-tier
//! rate limits.
//!
//! Only one run executes at a time: callers must hold a [`RunPermit`],
//! obtained from [`ArticleAggregator::try_acquire`].

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::summarizer::SummaryChain;
use crate::models::config::{AggregatorConfig, ENV_NOTION_DATABASE_ID, ENV_NOTION_TOKEN};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{RunReport, RunTrigger, SummarizedArticle};
use crate::providers::{ArticleScraper, FeedClient, HttpTransport, NotionClient};
use crate::telemetry::RunTelemetry;
use crate::utils::cache::SeenCache;

/// Proof of exclusive ownership of the single run slot
pub type RunPermit = OwnedMutexGuard<()>;

pub struct ArticleAggregator {
    config: Arc<AggregatorConfig>,
    feeds: FeedClient,
    scraper: ArticleScraper,
    summaries: SummaryChain,
    /// None only in dry-run mode without Notion credentials
    notion: Option<NotionClient>,
    seen: SeenCache,
    telemetry: Arc<RunTelemetry>,
    run_lock: Arc<Mutex<()>>,
}

impl ArticleAggregator {
    pub fn new(config: AggregatorConfig, telemetry: Arc<RunTelemetry>) -> AppResult<Self> {
        let api_http = HttpTransport::api(config.request_timeout, config.retry)?;
        let page_http = HttpTransport::browser(config.retry)?;

        let notion = match (
            &config.secrets.notion_token,
            &config.secrets.notion_database_id,
        ) {
            (Some(token), Some(database_id)) => Some(NotionClient::new(
                api_http.clone(),
                &config.endpoints.notion,
                token.clone(),
                database_id.clone(),
            )),
            _ if config.dry_run => None,
            (None, _) => return Err(AppError::missing_env(ENV_NOTION_TOKEN)),
            (_, None) => return Err(AppError::missing_env(ENV_NOTION_DATABASE_ID)),
        };

        let summaries = SummaryChain::from_config(&config, &api_http);

        Ok(Self {
            feeds: FeedClient::new(api_http),
            scraper: ArticleScraper::new(page_http),
            summaries,
            notion,
            seen: SeenCache::with_ttl(config.seen_ttl),
            telemetry,
            run_lock: Arc::new(Mutex::new(())),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &Arc<RunTelemetry> {
        &self.telemetry
    }

    pub fn seen_cache(&self) -> &SeenCache {
        &self.seen
    }

    /// Configured LLM providers, in fallback order
    pub fn providers(&self) -> Vec<&'static str> {
        self.summaries.provider_names()
    }

    /// Claim the run slot, or `RUN_IN_PROGRESS` if a run holds it
    pub fn try_acquire(&self) -> AppResult<RunPermit> {
        self.run_lock
            .clone()
            .try_lock_owned()
            .map_err(|_| AppError::run_in_progress())
    }

    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Acquire and run with a fresh run id
    pub async fn run_once(&self, trigger: RunTrigger) -> AppResult<RunReport> {
        let permit = self.try_acquire()?;
        Ok(self.run(permit, trigger, Uuid::new_v4()).await)
    }

    /// Execute one full run. Per-article failures are counted, never fatal.
    pub async fn run(&self, permit: RunPermit, trigger: RunTrigger, run_id: Uuid) -> RunReport {
        let mut report = RunReport::new(run_id, trigger, self.config.dry_run);
        info!(
            "🚀 Starting aggregation run {} ({}) at {}",
            run_id,
            trigger.as_str(),
            report.started_at.to_rfc3339()
        );
        self.seen.cleanup_expired();

        let collected = self.collect(&mut report).await;

        if self.config.dry_run {
            for item in &collected {
                info!(
                    "🧪 [dry run] {} ({}, {})\n{}",
                    item.article.title,
                    item.article.category,
                    item.summary.source.as_str(),
                    item.summary.text
                );
            }
        } else {
            self.publish(&collected, &mut report).await;
        }

        report.finish();
        self.telemetry.record_run(&report);
        drop(permit);

        if report.is_failure() {
            error!("❌ {}", report.summary());
        } else {
            info!("✅ {}", report.summary());
        }
        report
    }

    /// Phase 1: feeds -> pages -> summaries
    async fn collect(&self, report: &mut RunReport) -> Vec<SummarizedArticle> {
        let cutoff = lookback_cutoff(Utc::now(), self.config.hours_back);
        let mut collected = Vec::new();
        let mut this_run: HashSet<String> = HashSet::new();

        for source in &self.config.sources {
            report.feeds_polled += 1;
            let articles = match self.feeds.fetch_recent(source, cutoff).await {
                Ok(articles) => articles,
                Err(e) => {
                    warn!("⚠️ Feed {} skipped: {}", source.url, e);
                    report.feed_errors += 1;
                    continue;
                }
            };

            for article in articles {
                report.articles_found += 1;

                let key = SeenCache::normalize_url(&article.url);
                if self.seen.contains(&article.url) || !this_run.insert(key) {
                    report.duplicates_skipped += 1;
                    continue;
                }

                match self.scraper.scrape(&article.url).await {
                    Ok(content) => {
                        let summary = self.summaries.summarize(&article.title, &content).await;
                        report.record_summary(summary.source);
                        collected.push(SummarizedArticle { article, summary });
                    }
                    Err(e) => {
                        warn!("⚠️ Skipping '{}': {}", article.title, e);
                        report.scrape_failures += 1;
                    }
                }

                tokio::time::sleep(self.config.article_delay).await;
            }
        }

        info!(
            "📚 Collected {} summaries from {} feeds",
            collected.len(),
            report.feeds_polled
        );
        collected
    }

    /// Phase 2: write pages; a URL is remembered only once Notion accepted it
    async fn publish(&self, collected: &[SummarizedArticle], report: &mut RunReport) {
        let Some(notion) = &self.notion else {
            return;
        };

        for item in collected {
            match notion.create_page(item).await {
                Ok(()) => {
                    report.published += 1;
                    self.seen.mark(&item.article.url);
                    info!("📝 Added: {}", item.article.title);
                }
                Err(e) => {
                    report.publish_failures += 1;
                    error!("❌ Failed to add '{}': {}", item.article.title, e);
                }
            }
            tokio::time::sleep(self.config.publish_delay).await;
        }

        info!(
            "Successfully added {}/{} articles",
            report.published,
            collected.len()
        );
    }
}

/// `now - hours_back`, saturating at the earliest representable instant
fn lookback_cutoff(now: DateTime<Utc>, hours_back: i64) -> DateTime<Utc> {
    ChronoDuration::try_hours(hours_back)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;

    fn dry_run_aggregator() -> ArticleAggregator {
        let config = AggregatorConfig {
            dry_run: true,
            ..AggregatorConfig::default()
        };
        ArticleAggregator::new(config, Arc::new(RunTelemetry::new())).unwrap()
    }

    #[test]
    fn test_single_run_permit() {
        let aggregator = dry_run_aggregator();
        assert!(!aggregator.is_running());

        let permit = aggregator.try_acquire().unwrap();
        assert!(aggregator.is_running());
        let err = aggregator.try_acquire().unwrap_err();
        assert_eq!(err.code, ErrorCode::RunInProgress);

        drop(permit);
        assert!(!aggregator.is_running());
        assert!(aggregator.try_acquire().is_ok());
    }

    #[test]
    fn test_lookback_cutoff_saturates() {
        let now = Utc::now();
        assert_eq!(lookback_cutoff(now, 24), now - ChronoDuration::hours(24));
        assert_eq!(lookback_cutoff(now, 3_000_000_000), DateTime::<Utc>::MIN_UTC);
        assert_eq!(lookback_cutoff(now, i64::MAX), DateTime::<Utc>::MIN_UTC);
    }

    #[tokio::test]
    async fn test_oversized_lookback_does_not_abort_run() {
        let config = AggregatorConfig {
            dry_run: true,
            hours_back: 3_000_000_000,
            sources: vec![crate::models::types::FeedSource::new("Tech", "http://127.0.0.1:9/feed.xml")],
            retry: crate::models::config::RetryPolicy::none(),
            ..AggregatorConfig::default()
        };
        let aggregator = ArticleAggregator::new(config, Arc::new(RunTelemetry::new())).unwrap();
        let report = aggregator.run_once(RunTrigger::Cli).await.unwrap();
        assert_eq!(report.feeds_polled, 1);
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn test_publishing_requires_notion() {
        let err = ArticleAggregator::new(AggregatorConfig::default(), Arc::new(RunTelemetry::new()))
            .err()
            .unwrap();
        assert_eq!(err.code, ErrorCode::ConfigMissingEnv);
    }
}

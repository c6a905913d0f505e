//! Article Aggregator - one-shot run
//!
//! Invoked by the daily CI job. Reads configuration from the environment,
//! runs one aggregation and exits non-zero when summaries were produced but
//! none reached Notion.

use article_aggregator::{AggregatorConfig, ArticleAggregator, RunTelemetry, RunTrigger};

use eyre::{eyre, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG overrides the default level)
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    info!(
        "📰 {} v{} starting at {}",
        article_aggregator::utils::APP_NAME,
        article_aggregator::utils::APP_VERSION,
        chrono::Utc::now().to_rfc3339()
    );

    let config = AggregatorConfig::from_env().map_err(|e| {
        error!("❌ {}", e);
        eyre!(e.to_string())
    })?;

    let telemetry = Arc::new(RunTelemetry::new());
    let aggregator = ArticleAggregator::new(config, telemetry)?;

    let report = aggregator.run_once(RunTrigger::Cli).await?;

    if report.is_failure() {
        return Err(eyre!(
            "{} summarized articles but none were published to Notion",
            report.summarized
        ));
    }

    Ok(())
}

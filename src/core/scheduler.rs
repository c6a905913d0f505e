//! In-process cron trigger
//!
//! Sleeps until the next fire time, then starts a run in the background if
//! the run slot is free. A tick that lands while another run (usually a
//! manual dispatch) is active is skipped, not queued.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::aggregator::ArticleAggregator;
use crate::models::types::RunTrigger;
use crate::utils::cron::{until_next, CronSchedule};

/// Runs until `shutdown` flips to true (or its sender is dropped)
pub async fn run_scheduler(
    aggregator: Arc<ArticleAggregator>,
    schedule: CronSchedule,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let Some((next, wait)) = until_next(&schedule, Utc::now()) else {
            warn!("⚠️ Schedule never fires again; scheduler stopping");
            return;
        };
        info!("⏰ Next scheduled run at {} (in {}s)", next.to_rfc3339(), wait.as_secs());

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("🛑 Scheduler stopped");
                    return;
                }
                continue;
            }
        }

        match aggregator.try_acquire() {
            Ok(permit) => {
                let aggregator = aggregator.clone();
                tokio::spawn(async move {
                    aggregator
                        .run(permit, RunTrigger::Schedule, Uuid::new_v4())
                        .await;
                });
            }
            Err(e) => {
                warn!("⏭️ Skipping scheduled tick at {}: {}", next.to_rfc3339(), e);
            }
        }
    }
}

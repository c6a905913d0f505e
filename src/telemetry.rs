//! Telemetry Module for the Article Aggregator
//!
//! Aggregates run reports for `/v1/stats`, keeps a bounded history for
//! `/v1/runs`, and exports a JSON snapshot on shutdown.
//!
//! Only counters and run metadata are kept; no article text, no credentials.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::types::RunReport;
use crate::utils::constants::{RUN_HISTORY_CAPACITY, TELEMETRY_DIR};

/// Aggregated statistics across all runs in this process
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelemetryStats {
    pub total_runs: u64,
    /// Runs that summarized articles but published none
    pub failed_runs: u64,
    pub articles_found: u64,
    pub duplicates_skipped: u64,
    pub scrape_failures: u64,
    pub feed_errors: u64,
    pub summarized: u64,
    pub summaries_by_source: HashMap<String, u64>,
    pub published: u64,
    pub publish_failures: u64,
    /// Mean wall-clock run time (ms)
    pub avg_run_ms: f64,
    pub last_run_at: Option<String>,
    pub period_start: u64,
    pub period_end: u64,
}

impl TelemetryStats {
    /// Share of publish attempts that reached Notion, in percent
    pub fn publish_success_rate(&self) -> f64 {
        let attempts = self.published + self.publish_failures;
        if attempts == 0 {
            0.0
        } else {
            self.published as f64 / attempts as f64 * 100.0
        }
    }

    /// Shutdown report for the logs
    pub fn report(&self) -> String {
        let period_hours = self.period_end.saturating_sub(self.period_start) / 3600;
        format!(
            r#"
╔══════════════════════════════════════════════════════╗
║           📰 ARTICLE AGGREGATOR - SESSION REPORT     ║
╠══════════════════════════════════════════════════════╣
║   ⏱️  Uptime:              {:>10} h                  ║
║   🔁 Runs:                 {:>10}                    ║
║   ❌ Failed runs:          {:>10}                    ║
║   📰 Articles found:       {:>10}                    ║
║   🤖 Summarized:           {:>10}                    ║
║   📝 Published:            {:>10}                    ║
║   ✅ Publish success:      {:>9.1}%                    ║
║   ⚡ Avg run time:         {:>10.0} ms                ║
╚══════════════════════════════════════════════════════╝
"#,
            period_hours,
            self.total_runs,
            self.failed_runs,
            self.articles_found,
            self.summarized,
            self.published,
            self.publish_success_rate(),
            self.avg_run_ms,
        )
    }
}

/// Process-wide run telemetry
pub struct RunTelemetry {
    /// Newest report at the back
    history: RwLock<VecDeque<RunReport>>,
    history_capacity: usize,
    total_runs: AtomicU64,
    failed_runs: AtomicU64,
    articles_found: AtomicU64,
    duplicates_skipped: AtomicU64,
    scrape_failures: AtomicU64,
    feed_errors: AtomicU64,
    summarized: AtomicU64,
    published: AtomicU64,
    publish_failures: AtomicU64,
    total_run_ms: AtomicU64,
    summaries_by_source: RwLock<HashMap<String, u64>>,
    session_start: u64,
    export_dir: PathBuf,
}

impl RunTelemetry {
    pub fn new() -> Self {
        Self::with_config(PathBuf::from(TELEMETRY_DIR), RUN_HISTORY_CAPACITY)
    }

    pub fn with_config(export_dir: PathBuf, history_capacity: usize) -> Self {
        Self {
            history: RwLock::new(VecDeque::with_capacity(history_capacity)),
            history_capacity: history_capacity.max(1),
            total_runs: AtomicU64::new(0),
            failed_runs: AtomicU64::new(0),
            articles_found: AtomicU64::new(0),
            duplicates_skipped: AtomicU64::new(0),
            scrape_failures: AtomicU64::new(0),
            feed_errors: AtomicU64::new(0),
            summarized: AtomicU64::new(0),
            published: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
            total_run_ms: AtomicU64::new(0),
            summaries_by_source: RwLock::new(HashMap::new()),
            session_start: current_timestamp(),
            export_dir,
        }
    }

    /// Fold a finished run into the counters and history
    pub fn record_run(&self, report: &RunReport) {
        self.total_runs.fetch_add(1, Ordering::Relaxed);
        if report.is_failure() {
            self.failed_runs.fetch_add(1, Ordering::Relaxed);
        }
        self.articles_found
            .fetch_add(report.articles_found, Ordering::Relaxed);
        self.duplicates_skipped
            .fetch_add(report.duplicates_skipped, Ordering::Relaxed);
        self.scrape_failures
            .fetch_add(report.scrape_failures, Ordering::Relaxed);
        self.feed_errors.fetch_add(report.feed_errors, Ordering::Relaxed);
        self.summarized.fetch_add(report.summarized, Ordering::Relaxed);
        self.published.fetch_add(report.published, Ordering::Relaxed);
        self.publish_failures
            .fetch_add(report.publish_failures, Ordering::Relaxed);
        if let Some(ms) = report.duration_ms() {
            self.total_run_ms
                .fetch_add(ms.max(0) as u64, Ordering::Relaxed);
        }

        if let Ok(mut counts) = self.summaries_by_source.write() {
            for (source, n) in &report.summaries_by_source {
                *counts.entry(source.clone()).or_insert(0) += n;
            }
        }

        if let Ok(mut history) = self.history.write() {
            if history.len() >= self.history_capacity {
                history.pop_front();
            }
            history.push_back(report.clone());
        }
    }

    /// Up to `limit` reports, newest first
    pub fn recent_runs(&self, limit: usize) -> Vec<RunReport> {
        self.history
            .read()
            .map(|h| h.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_stats(&self) -> TelemetryStats {
        let total_runs = self.total_runs.load(Ordering::Relaxed);
        let total_ms = self.total_run_ms.load(Ordering::Relaxed);
        let avg_run_ms = if total_runs > 0 {
            total_ms as f64 / total_runs as f64
        } else {
            0.0
        };

        let last_run_at = self
            .history
            .read()
            .ok()
            .and_then(|h| h.back().map(|r| r.started_at.to_rfc3339()));

        TelemetryStats {
            total_runs,
            failed_runs: self.failed_runs.load(Ordering::Relaxed),
            articles_found: self.articles_found.load(Ordering::Relaxed),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            scrape_failures: self.scrape_failures.load(Ordering::Relaxed),
            feed_errors: self.feed_errors.load(Ordering::Relaxed),
            summarized: self.summarized.load(Ordering::Relaxed),
            summaries_by_source: self
                .summaries_by_source
                .read()
                .map(|c| c.clone())
                .unwrap_or_default(),
            published: self.published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            avg_run_ms,
            last_run_at,
            period_start: self.session_start,
            period_end: current_timestamp(),
        }
    }

    /// Write `stats_<unix>.json` into the export directory
    pub fn export_stats_json(&self) -> Result<PathBuf, std::io::Error> {
        fs::create_dir_all(&self.export_dir)?;
        let stats = self.get_stats();
        let path = self
            .export_dir
            .join(format!("stats_{}.json", current_timestamp()));

        let json = serde_json::to_string_pretty(&stats)?;
        fs::write(&path, json)?;

        Ok(path)
    }
}

impl Default for RunTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

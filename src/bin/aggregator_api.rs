//! Article Aggregator daemon
//!
//! Runs the cron scheduler in-process and serves the control API
//! (health, stats, run history, manual dispatch).
//!
//! Usage:
//!   cargo run --bin aggregator_api
//!
//! Environment:
//!   AGGREGATOR_API_PORT / PORT - Server port (default: 8080)
//!   AGGREGATOR_API_HOST        - Server host (default: 0.0.0.0)
//!   AGGREGATOR_API_TOKEN       - Required on non-health routes when set
//!   AGGREGATOR_SCHEDULE        - 5-field cron, UTC (default: 0 1 * * *)
//!   RUST_LOG                   - Log level (default: info)

use article_aggregator::api::{create_router, AppState};
use article_aggregator::utils::{parse_cron, APP_VERSION};
use article_aggregator::{run_scheduler, AggregatorConfig, ArticleAggregator, RunTelemetry};
use eyre::eyre;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let config = AggregatorConfig::from_env().map_err(|e| {
        error!("❌ {}", e);
        eyre!(e.to_string())
    })?;
    let schedule = parse_cron(&config.schedule).map_err(|e| eyre!(e))?;
    let addr: SocketAddr = format!("{}:{}", config.api_host, config.api_port).parse()?;

    if config.api_token.is_none() {
        warn!("⚠️ AGGREGATOR_API_TOKEN not set: the control API is open to anyone who can reach it");
    }

    let telemetry = Arc::new(RunTelemetry::new());
    let aggregator = Arc::new(ArticleAggregator::new(config, telemetry.clone())?);

    // Scheduler
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = tokio::spawn(run_scheduler(aggregator.clone(), schedule, shutdown_rx));

    let state = Arc::new(AppState::new(aggregator.clone()));
    let app = create_router(state);

    info!("🚀 Article Aggregator API starting on http://{}", addr);
    info!("");
    info!("Endpoints:");
    info!("  GET  /v1/health           - Health check");
    info!("  GET  /v1/stats            - Aggregate run statistics");
    info!("  GET  /v1/runs?limit=N     - Recent run reports");
    info!("  POST /v1/dispatch         - Start a run now");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        let _ = shutdown_tx.send(true);
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("");
    info!("🛑 Shutdown signal received, cleaning up...");
    if let Err(e) = scheduler.await {
        warn!("Scheduler task ended abnormally: {}", e);
    }
    if aggregator.is_running() {
        warn!("⚠️ A run was still in progress at shutdown; its pages may be partially published");
    }

    // Export final telemetry
    let stats = telemetry.get_stats();
    info!("{}", stats.report());
    match telemetry.export_stats_json() {
        Ok(path) => info!("   ✅ Stats exported to: {}", path.display()),
        Err(e) => warn!("   ⚠️ Failed to export stats: {}", e),
    }

    info!("👋 Article Aggregator API v{} shutdown complete", APP_VERSION);

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════════════╗
    ║                                                      ║
    ║        📰  A R T I C L E   A G G R E G A T O R       ║
    ║                                                      ║
    ║     feeds → scrape → summarize → Notion              ║
    ║              C O N T R O L   A P I                   ║
    ║                                                      ║
    ╚══════════════════════════════════════════════════════╝
    "#
    );
}

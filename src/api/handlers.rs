//! API Request Handlers

use axum::{
    extract::{rejection::QueryRejection, Json, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use super::types::*;
use crate::core::aggregator::ArticleAggregator;
use crate::models::errors::{AppError, ErrorCode};
use crate::models::types::{RunReport, RunTrigger};
use crate::utils::constants::{APP_VERSION, RUN_HISTORY_CAPACITY};

/// Shared application state
pub struct AppState {
    pub aggregator: Arc<ArticleAggregator>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(aggregator: Arc<ArticleAggregator>) -> Self {
        Self {
            aggregator,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

pub type ApiErrorResponse = (StatusCode, Json<ApiResponse<()>>);

fn latency_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Envelope for an AppError, status from its code
pub fn error_response(err: &AppError, start: Instant) -> ApiErrorResponse {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResponse::error(ApiError::from(err), latency_ms(start))),
    )
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
        run_in_progress: state.aggregator.is_running(),
    };

    Json(ApiResponse::success(data, latency_ms(start)))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();
    let runs = state.aggregator.telemetry().get_stats();
    let seen_cache = state.aggregator.seen_cache().stats();

    info!(
        "📊 Seen cache: {} entries, {:.1}% hit rate ({} hits / {} misses)",
        seen_cache.entries, seen_cache.hit_rate, seen_cache.hits, seen_cache.misses
    );

    let data = StatsData {
        runs,
        seen_cache,
        providers: state.aggregator.providers(),
        uptime_seconds: state.uptime_seconds(),
        api_version: APP_VERSION.to_string(),
    };

    Json(ApiResponse::success(data, latency_ms(start)))
}

// ============================================
// Run History
// ============================================

pub async fn list_runs(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RunsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<RunReport>>>, ApiErrorResponse> {
    let start = Instant::now();
    let Query(query) = query
        .map_err(|rejection| error_response(&AppError::bad_request(rejection.body_text()), start))?;

    let limit = query.limit.clamp(1, RUN_HISTORY_CAPACITY);
    let runs = state.aggregator.telemetry().recent_runs(limit);
    Ok(Json(ApiResponse::success(runs, latency_ms(start))))
}

// ============================================
// Manual Dispatch
// ============================================

/// Start a run in the background; 409 while another run holds the slot
pub async fn dispatch_run(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<ApiResponse<DispatchData>>), ApiErrorResponse> {
    let start = Instant::now();

    let permit = state.aggregator.try_acquire().map_err(|e| {
        warn!("⏭️ Dispatch rejected: {}", e);
        error_response(&e, start)
    })?;

    let run_id = Uuid::new_v4();
    let aggregator = state.aggregator.clone();
    tokio::spawn(async move {
        aggregator.run(permit, RunTrigger::Dispatch, run_id).await;
    });
    info!("🚀 Dispatched run {}", run_id);

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(
            DispatchData {
                run_id,
                trigger: RunTrigger::Dispatch.as_str().to_string(),
            },
            latency_ms(start),
        )),
    ))
}

// ============================================
// Fallback
// ============================================

pub async fn not_found() -> ApiErrorResponse {
    let start = Instant::now();
    error_response(
        &AppError::new(ErrorCode::ApiNotFound, "Route not found"),
        start,
    )
}

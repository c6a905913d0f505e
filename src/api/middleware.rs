//! API Middleware (Auth, Logging)

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::handlers::{error_response, AppState};
use crate::models::errors::AppError;

const OPEN_PATHS: [&str; 2] = ["/health", "/v1/health"];

/// Token from `Authorization: Bearer <t>` or `X-API-Key: <t>`
fn presented_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    bearer.or_else(|| {
        headers
            .get("X-API-Key")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    })
}

/// Length-independent comparison of two tokens
fn tokens_match(presented: &str, expected: &str) -> bool {
    let a = presented.as_bytes();
    let b = expected.as_bytes();
    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= (x ^ y) as usize;
    }
    diff == 0
}

/// API token authentication. Without a configured token the API is open.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    if OPEN_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let Some(expected) = state.aggregator.config().api_token.as_ref() else {
        return next.run(request).await;
    };

    match presented_token(request.headers()) {
        Some(token) if tokens_match(token, expected.expose()) => next.run(request).await,
        Some(_) => {
            warn!("Invalid API token attempted");
            error_response(&AppError::unauthorized(), start).into_response()
        }
        None => error_response(&AppError::unauthorized(), start).into_response(),
    }
}

/// Request logging middleware
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        "Request completed"
    );

    response
}

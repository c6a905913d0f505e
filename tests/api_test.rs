//! Control API: auth, envelopes, dispatch and run history

use article_aggregator::api::{create_router, AppState};
use article_aggregator::{
    AggregatorConfig, ArticleAggregator, FeedSource, RetryPolicy, RunTelemetry, Secret,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const TOKEN: &str = "ops-token-42";

/// Dry run against a closed local port: runs finish fast and write nothing
fn setup(api_token: Option<&str>) -> (Router, Arc<ArticleAggregator>) {
    let config = AggregatorConfig {
        dry_run: true,
        api_token: api_token.map(Secret::new),
        sources: vec![FeedSource::new("Tech", "http://127.0.0.1:9/feed.xml")],
        retry: RetryPolicy::none(),
        article_delay: Duration::ZERO,
        publish_delay: Duration::ZERO,
        ..AggregatorConfig::default()
    };
    let aggregator =
        Arc::new(ArticleAggregator::new(config, Arc::new(RunTelemetry::new())).unwrap());
    let router = create_router(Arc::new(AppState::new(aggregator.clone())));
    (router, aggregator)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn authed(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap()
}

async fn wait_until_idle(aggregator: &ArticleAggregator) {
    for _ in 0..200 {
        if !aggregator.is_running() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("run did not finish in time");
}

#[tokio::test]
async fn test_health_is_open() {
    let (router, _) = setup(Some(TOKEN));

    for uri in ["/health", "/v1/health"] {
        let (status, body) = send(&router, get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "healthy");
        assert_eq!(body["data"]["run_in_progress"], false);
        assert!(body["data"]["version"].is_string());
    }
}

#[tokio::test]
async fn test_protected_routes_need_token() {
    let (router, _) = setup(Some(TOKEN));

    let (status, body) = send(&router, get("/v1/stats")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "API_UNAUTHORIZED");

    let wrong = Request::builder()
        .uri("/v1/stats")
        .header("Authorization", "Bearer not-the-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&router, wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&router, authed("GET", "/v1/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_runs"], 0);
    assert_eq!(body["data"]["seen_cache"]["entries"], 0);

    let api_key = Request::builder()
        .uri("/v1/runs")
        .header("X-API-Key", TOKEN)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, api_key).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], Value::Array(vec![]));
}

#[tokio::test]
async fn test_open_without_configured_token() {
    let (router, _) = setup(None);
    let (status, body) = send(&router, get("/v1/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_dispatch_records_run() {
    let (router, aggregator) = setup(Some(TOKEN));

    let (status, body) = send(&router, authed("POST", "/v1/dispatch")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["trigger"], "dispatch");
    let run_id = body["data"]["run_id"].as_str().unwrap().to_string();

    wait_until_idle(&aggregator).await;

    let (status, body) = send(&router, authed("GET", "/v1/runs?limit=5")).await;
    assert_eq!(status, StatusCode::OK);
    let runs = body["data"].as_array().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["run_id"], run_id);
    assert_eq!(runs[0]["trigger"], "dispatch");
    assert_eq!(runs[0]["feeds_polled"], 1);
    assert_eq!(runs[0]["feed_errors"], 1);
    assert_eq!(runs[0]["dry_run"], true);
}

#[tokio::test]
async fn test_dispatch_conflicts_while_running() {
    let (router, aggregator) = setup(Some(TOKEN));

    let permit = aggregator.try_acquire().unwrap();
    let (status, body) = send(&router, authed("POST", "/v1/dispatch")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "RUN_IN_PROGRESS");

    let (_, health) = send(&router, get("/health")).await;
    assert_eq!(health["data"]["run_in_progress"], true);

    drop(permit);
    let (status, _) = send(&router, authed("POST", "/v1/dispatch")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    wait_until_idle(&aggregator).await;
}

#[tokio::test]
async fn test_unknown_route_envelope() {
    let (router, _) = setup(Some(TOKEN));
    let (status, body) = send(&router, authed("GET", "/v1/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "API_NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_runs_query_uses_envelope() {
    let (router, _) = setup(Some(TOKEN));
    let (status, body) = send(&router, authed("GET", "/v1/runs?limit=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "API_BAD_REQUEST");
    assert!(body["error"]["message"].as_str().unwrap().contains("query string"));
    assert!(body["timestamp"].is_i64());
}

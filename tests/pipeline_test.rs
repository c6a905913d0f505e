//! End-to-end runs against local stand-ins for the feed host, article pages,
//! Groq and Notion.

use article_aggregator::{
    AggregatorConfig, ArticleAggregator, FeedSource, FileConfig, RetryPolicy, RunTelemetry,
    RunTrigger,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const GROQ_KEY: &str = "gsk_live_9f8e7d";
const NOTION_TOKEN: &str = "secret_notion_abc123";
const NOTION_DB: &str = "db-test-123";

#[derive(Debug, Clone)]
struct Captured {
    authorization: Option<String>,
    notion_version: Option<String>,
    body: Value,
}

impl Captured {
    fn from(headers: &HeaderMap, body: Value) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            authorization: header("authorization"),
            notion_version: header("notion-version"),
            body,
        }
    }
}

struct Upstream {
    base_url: String,
    groq: Mutex<Vec<Captured>>,
    openai: Mutex<Vec<Captured>>,
    huggingface: Mutex<Vec<Captured>>,
    notion: Mutex<Vec<Captured>>,
    flaky_hits: AtomicUsize,
    rejected_hits: AtomicUsize,
}

fn rss(base: &str) -> String {
    let fresh = (Utc::now() - Duration::hours(1)).to_rfc2822();
    let stale = (Utc::now() - Duration::hours(30)).to_rfc2822();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <title>Mock Tech Daily</title>
  <link>{base}</link>
  <description>test feed</description>
  <item><title>Startup raises Series B</title><link>{base}/articles/1</link><pubDate>{fresh}</pubDate></item>
  <item><title>Chipmaker beats estimates</title><link>{base}/articles/2</link><pubDate>{fresh}</pubDate></item>
  <item><title>Gone story</title><link>{base}/articles/404</link><pubDate>{fresh}</pubDate></item>
  <item><title>Old news</title><link>{base}/articles/3</link><pubDate>{stale}</pubDate></item>
</channel></rss>"#
    )
}

async fn feed(State(up): State<Arc<Upstream>>) -> Response {
    ([("content-type", "application/rss+xml")], rss(&up.base_url)).into_response()
}

async fn article(Path(id): Path<String>) -> Response {
    if id == "404" {
        return (StatusCode::NOT_FOUND, "gone").into_response();
    }
    let sentence = "The company reported strong quarterly growth driven by enterprise customers";
    let body = vec![sentence; 8].join(". ");
    let html = format!(
        "<html><head><title>Story {id}</title></head><body>\
         <nav>Home | Tech | Health | Subscribe to our newsletter today</nav>\
         <article><h1>Story number {id} headline here</h1><p>{body}.</p></article>\
         <footer>Copyright 2026 Mock Media Group, all rights reserved</footer>\
         </body></html>"
    );
    ([("content-type", "text/html")], html).into_response()
}

async fn groq(State(up): State<Arc<Upstream>>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    up.groq.lock().unwrap().push(Captured::from(&headers, body));
    Json(json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": "Executive Summary:\n• Revenue grew 47% to $2.1B on enterprise AI demand\n• Churn fell 23% thanks to predictive analytics tooling\n• Partnership opens access to 150M enterprise users"
            }
        }]
    }))
}

async fn openai(State(up): State<Arc<Upstream>>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    up.openai.lock().unwrap().push(Captured::from(&headers, body));
    Json(json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": "1. Quarterly revenue rose 12% on cloud subscriptions\n2. Operating margin widened to 31% after cost cuts"
            }
        }]
    }))
}

async fn huggingface(State(up): State<Arc<Upstream>>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    up.huggingface.lock().unwrap().push(Captured::from(&headers, body));
    Json(json!([{
        "generated_text": " • Trial enrolled 1,200 patients across 40 hospital sites\n• Readmissions dropped 18% within six months of rollout"
    }]))
}

async fn groq_down() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "overloaded").into_response()
}

async fn notion(State(up): State<Arc<Upstream>>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    up.notion.lock().unwrap().push(Captured::from(&headers, body));
    Json(json!({ "object": "page", "id": "page-1" }))
}

/// Fails the first write with 503, accepts the rest
async fn notion_flaky(State(up): State<Arc<Upstream>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if up.flaky_hits.fetch_add(1, Ordering::SeqCst) == 0 {
        return (StatusCode::SERVICE_UNAVAILABLE, "try again").into_response();
    }
    notion(State(up), headers, Json(body)).await.into_response()
}

async fn notion_rejects(State(up): State<Arc<Upstream>>) -> Response {
    up.rejected_hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "object": "error", "code": "validation_error", "message": "Category is not a property" })),
    )
        .into_response()
}

async fn start_upstream() -> Arc<Upstream> {
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let upstream = Arc::new(Upstream {
        base_url: format!("http://{}:{}", addr.ip(), addr.port()),
        groq: Mutex::new(Vec::new()),
        openai: Mutex::new(Vec::new()),
        huggingface: Mutex::new(Vec::new()),
        notion: Mutex::new(Vec::new()),
        flaky_hits: AtomicUsize::new(0),
        rejected_hits: AtomicUsize::new(0),
    });

    let app = Router::new()
        .route("/feed.xml", get(feed))
        .route("/articles/:id", get(article))
        .route("/groq", post(groq))
        .route("/groq-down", post(groq_down))
        .route("/openai", post(openai))
        .route("/hf", post(huggingface))
        .route("/flaky/v1/pages", post(notion_flaky))
        .route("/v1/pages", post(notion))
        .route("/rejecting/v1/pages", post(notion_rejects))
        .with_state(upstream.clone());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("mock upstream error: {}", e);
        }
    });

    upstream
}

/// Config as the CI job would build it, pointed at the mock upstream
fn config(up: &Upstream, overrides: &[(&str, String)]) -> AggregatorConfig {
    let mut env: HashMap<String, String> = HashMap::from([
        ("NOTION_TOKEN".to_string(), NOTION_TOKEN.to_string()),
        ("NOTION_DATABASE_ID".to_string(), NOTION_DB.to_string()),
        ("GROQ_API_KEY".to_string(), GROQ_KEY.to_string()),
        ("GROQ_API_URL".to_string(), format!("{}/groq", up.base_url)),
        ("NOTION_API_URL".to_string(), up.base_url.clone()),
        ("AGGREGATOR_ARTICLE_DELAY_MS".to_string(), "0".to_string()),
        ("AGGREGATOR_PUBLISH_DELAY_MS".to_string(), "0".to_string()),
    ]);
    for (k, v) in overrides {
        env.insert(k.to_string(), v.clone());
    }

    let file = FileConfig {
        sources: Some(vec![FeedSource::new("Tech", format!("{}/feed.xml", up.base_url))]),
        ..FileConfig::default()
    };

    let mut config = AggregatorConfig::from_lookup(|k: &str| env.get(k).cloned(), file).unwrap();
    config.retry = RetryPolicy::none();
    config
}

fn aggregator(config: AggregatorConfig) -> ArticleAggregator {
    ArticleAggregator::new(config, Arc::new(RunTelemetry::new())).unwrap()
}

#[tokio::test]
async fn test_full_run_publishes_recent_articles() {
    let up = start_upstream().await;
    let aggregator = aggregator(config(&up, &[]));

    let report = aggregator.run_once(RunTrigger::Cli).await.unwrap();

    assert_eq!(report.feeds_polled, 1);
    assert_eq!(report.feed_errors, 0);
    assert_eq!(report.articles_found, 3, "stale entry is filtered out");
    assert_eq!(report.scrape_failures, 1);
    assert_eq!(report.summarized, 2);
    assert_eq!(report.summaries_by_source.get("groq"), Some(&2));
    assert_eq!(report.published, 2);
    assert_eq!(report.publish_failures, 0);
    assert!(!report.is_failure());
    assert!(report.finished_at.is_some());

    let pages = up.notion.lock().unwrap().clone();
    assert_eq!(pages.len(), 2);
    let props = &pages[0].body["properties"];
    assert_eq!(props["Title"]["title"][0]["text"]["content"], "Startup raises Series B");
    assert_eq!(props["URL"]["url"], format!("{}/articles/1", up.base_url));
    assert_eq!(props["Source"]["rich_text"][0]["text"]["content"], "Mock Tech Daily");
    assert_eq!(props["Category"]["select"]["name"], "Tech");
    assert_eq!(
        props["Summary"]["rich_text"][0]["text"]["content"],
        "• Revenue grew 47% to $2.1B on enterprise AI demand\n\
         • Churn fell 23% thanks to predictive analytics tooling\n\
         • Partnership opens access to 150M enterprise users"
    );
}

#[tokio::test]
async fn test_secrets_pass_through_unmodified() {
    let up = start_upstream().await;
    let aggregator = aggregator(config(&up, &[]));
    aggregator.run_once(RunTrigger::Cli).await.unwrap();

    let groq_calls = up.groq.lock().unwrap().clone();
    assert_eq!(groq_calls.len(), 2);
    for call in &groq_calls {
        assert_eq!(call.authorization.as_deref(), Some(&*format!("Bearer {}", GROQ_KEY)));
        assert_eq!(call.body["max_tokens"], 300);
        let user = call.body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("The company reported strong quarterly growth"));
        assert!(!user.contains("Subscribe to our newsletter"), "nav text must be stripped");
    }

    for page in up.notion.lock().unwrap().iter() {
        assert_eq!(page.authorization.as_deref(), Some(&*format!("Bearer {}", NOTION_TOKEN)));
        assert_eq!(page.notion_version.as_deref(), Some("2022-06-28"));
        assert_eq!(page.body["parent"]["database_id"], NOTION_DB);
    }
}

#[tokio::test]
async fn test_second_run_skips_published_urls() {
    let up = start_upstream().await;
    let aggregator = aggregator(config(&up, &[]));

    let first = aggregator.run_once(RunTrigger::Schedule).await.unwrap();
    assert_eq!(first.published, 2);

    let second = aggregator.run_once(RunTrigger::Dispatch).await.unwrap();
    assert_eq!(second.articles_found, 3);
    assert_eq!(second.duplicates_skipped, 2);
    assert_eq!(second.summarized, 0);
    assert_eq!(second.published, 0);
    assert!(!second.is_failure(), "nothing new to publish is not a failure");

    assert_eq!(up.notion.lock().unwrap().len(), 2);
    assert_eq!(aggregator.telemetry().get_stats().total_runs, 2);
}

#[tokio::test]
async fn test_provider_outage_falls_back_to_extractive() {
    let up = start_upstream().await;
    let config = config(&up, &[("GROQ_API_URL", format!("{}/groq-down", up.base_url))]);
    let aggregator = aggregator(config);

    let report = aggregator.run_once(RunTrigger::Cli).await.unwrap();
    assert_eq!(report.summarized, 2);
    assert_eq!(report.summaries_by_source.get("extractive"), Some(&2));
    assert_eq!(report.published, 2);

    let pages = up.notion.lock().unwrap().clone();
    let summary = pages[0].body["properties"]["Summary"]["rich_text"][0]["text"]["content"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(summary.starts_with("• "));
    assert!(summary.lines().count() <= 3);
}

#[tokio::test]
async fn test_notion_rejection_fails_the_run() {
    let up = start_upstream().await;
    let config = config(&up, &[("NOTION_API_URL", format!("{}/rejecting", up.base_url))]);
    let aggregator = aggregator(config);

    let report = aggregator.run_once(RunTrigger::Cli).await.unwrap();
    assert_eq!(report.summarized, 2);
    assert_eq!(report.published, 0);
    assert_eq!(report.publish_failures, 2);
    assert!(report.is_failure());

    // Rejected URLs are not remembered, so the next run retries them
    assert_eq!(aggregator.seen_cache().stats().entries, 0);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let up = start_upstream().await;
    let mut config = config(&up, &[]);
    config.dry_run = true;
    let aggregator = aggregator(config);

    let report = aggregator.run_once(RunTrigger::Cli).await.unwrap();
    assert!(report.dry_run);
    assert_eq!(report.summarized, 2);
    assert_eq!(report.published, 0);
    assert!(!report.is_failure());
    assert!(up.notion.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_broken_feed_counts_as_error() {
    let up = start_upstream().await;
    let mut config = config(&up, &[]);
    config.sources.push(FeedSource::new("Health", format!("{}/missing.xml", up.base_url)));
    let aggregator = aggregator(config);

    let report = aggregator.run_once(RunTrigger::Cli).await.unwrap();
    assert_eq!(report.feeds_polled, 2);
    assert_eq!(report.feed_errors, 1);
    assert_eq!(report.published, 2, "one broken feed does not stop the others");
}

#[tokio::test]
async fn test_run_in_progress_rejected() {
    let up = start_upstream().await;
    let aggregator = aggregator(config(&up, &[]));

    let _permit = aggregator.try_acquire().unwrap();
    let err = aggregator.run_once(RunTrigger::Dispatch).await.unwrap_err();
    assert_eq!(err.code_str(), "RUN_IN_PROGRESS");
}

fn quick_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay_ms: 10,
        max_delay_ms: 20,
        jitter_percent: 0,
    }
}

#[tokio::test]
async fn test_transient_notion_error_is_retried() {
    let up = start_upstream().await;
    let mut config = config(&up, &[("NOTION_API_URL", format!("{}/flaky", up.base_url))]);
    config.retry = quick_retry();
    let aggregator = aggregator(config);

    let report = aggregator.run_once(RunTrigger::Cli).await.unwrap();
    assert_eq!(report.published, 2);
    assert_eq!(report.publish_failures, 0);
    assert_eq!(up.flaky_hits.load(Ordering::SeqCst), 3, "one 503 then two accepted writes");

    let pages = up.notion.lock().unwrap().clone();
    assert_eq!(pages.len(), 2);
    assert_eq!(
        pages[0].body["properties"]["Title"]["title"][0]["text"]["content"],
        "Startup raises Series B"
    );
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let up = start_upstream().await;
    let mut config = config(&up, &[("NOTION_API_URL", format!("{}/rejecting", up.base_url))]);
    config.retry = quick_retry();
    let aggregator = aggregator(config);

    let report = aggregator.run_once(RunTrigger::Cli).await.unwrap();
    assert_eq!(report.publish_failures, 2);
    assert_eq!(up.rejected_hits.load(Ordering::SeqCst), 2, "one request per article");
}

#[tokio::test]
async fn test_groq_outage_falls_back_to_openai() {
    let up = start_upstream().await;
    let config = config(
        &up,
        &[
            ("GROQ_API_URL", format!("{}/groq-down", up.base_url)),
            ("OPENAI_API_KEY", "sk-openai-test".to_string()),
            ("OPENAI_API_URL", format!("{}/openai", up.base_url)),
        ],
    );
    let aggregator = aggregator(config);
    assert_eq!(aggregator.providers(), vec!["groq", "openai"]);

    let report = aggregator.run_once(RunTrigger::Cli).await.unwrap();
    assert_eq!(report.summaries_by_source.get("openai"), Some(&2));
    assert_eq!(report.published, 2);

    let calls = up.openai.lock().unwrap().clone();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer sk-openai-test"));
    assert_eq!(calls[0].body["model"], "gpt-3.5-turbo");
    assert_eq!(calls[0].body["max_tokens"], 200);

    let pages = up.notion.lock().unwrap().clone();
    assert_eq!(
        pages[0].body["properties"]["Summary"]["rich_text"][0]["text"]["content"],
        "• Quarterly revenue rose 12% on cloud subscriptions\n\
         • Operating margin widened to 31% after cost cuts"
    );
}

#[tokio::test]
async fn test_groq_outage_falls_back_to_huggingface() {
    let up = start_upstream().await;
    let config = config(
        &up,
        &[
            ("GROQ_API_URL", format!("{}/groq-down", up.base_url)),
            ("HUGGINGFACE_TOKEN", "hf_test_token".to_string()),
            ("HUGGINGFACE_MODEL_URL", format!("{}/hf", up.base_url)),
        ],
    );
    let aggregator = aggregator(config);

    let report = aggregator.run_once(RunTrigger::Cli).await.unwrap();
    assert_eq!(report.summaries_by_source.get("huggingface"), Some(&2));
    assert_eq!(report.summaries_by_source.get("groq"), None);
    assert_eq!(report.published, 2);

    let calls = up.huggingface.lock().unwrap().clone();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer hf_test_token"));
    assert_eq!(calls[0].body["parameters"]["max_new_tokens"], 200);
    assert_eq!(calls[0].body["parameters"]["return_full_text"], false);
    let inputs = calls[0].body["inputs"].as_str().unwrap();
    assert!(inputs.contains("Article Title: Startup raises Series B"));
    assert!(inputs.ends_with("Summary:"));

    let pages = up.notion.lock().unwrap().clone();
    assert_eq!(
        pages[0].body["properties"]["Summary"]["rich_text"][0]["text"]["content"],
        "• Trial enrolled 1,200 patients across 40 hospital sites\n\
         • Readmissions dropped 18% within six months of rollout"
    );
}

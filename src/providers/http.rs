//! Shared HTTP transport
//!
//! One reqwest client per purpose (API calls vs. article pages), gzip on,
//! fixed User-Agent, and exponential backoff with jitter on 429, 5xx,
//! timeouts and connection errors. Other statuses go back to the caller
//! untouched so each provider can decide what "success" means.

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::config::RetryPolicy;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::{BROWSER_USER_AGENT, SCRAPE_TIMEOUT_SECS, USER_AGENT as API_USER_AGENT};

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based): base * 2^(attempt-1), capped, ±jitter
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let base_delay = self.base_delay_ms.saturating_mul(2_u64.pow(exp));
        let capped_delay = base_delay.min(self.max_delay_ms);

        let jitter_range = (capped_delay * self.jitter_percent) / 100;
        let jitter: i64 = if jitter_range > 0 {
            rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64))
        } else {
            0
        };
        Duration::from_millis((capped_delay as i64 + jitter).max(0) as u64)
    }
}

fn should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration, retry: RetryPolicy) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        let ua = HeaderValue::from_str(user_agent)
            .map_err(|e| AppError::invalid_config(format!("Invalid User-Agent: {}", e)))?;
        headers.insert(USER_AGENT, ua);
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorCode::Unknown, "Failed to build HTTP client", e)
            })?;

        Ok(Self { client, retry })
    }

    /// Client for feeds and JSON APIs
    pub fn api(timeout: Duration, retry: RetryPolicy) -> AppResult<Self> {
        Self::new(API_USER_AGENT, timeout, retry)
    }

    /// Client for article pages: browser User-Agent, 15 s timeout
    pub fn browser(retry: RetryPolicy) -> AppResult<Self> {
        Self::new(
            BROWSER_USER_AGENT,
            Duration::from_secs(SCRAPE_TIMEOUT_SECS),
            retry,
        )
    }

    pub async fn get(&self, url: &str) -> AppResult<Response> {
        self.send_with_retry(url, || self.client.get(url)).await
    }

    pub async fn post_json(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &serde_json::Value,
    ) -> AppResult<Response> {
        self.send_with_retry(url, || {
            self.client.post(url).headers(headers.clone()).json(body)
        })
        .await
    }

    async fn send_with_retry<F>(&self, url: &str, build: F) -> AppResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let max_attempts = self.retry.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let last = attempt >= max_attempts;

            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if last || !should_retry_status(status) {
                        return Ok(response);
                    }
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        warn!(
                            "⏳ Rate limited (HTTP 429) by {}, backing off (attempt {}/{})",
                            host_of(url),
                            attempt,
                            max_attempts
                        );
                    } else {
                        warn!(
                            "⚠️ HTTP {} from {} (attempt {}/{})",
                            status,
                            host_of(url),
                            attempt,
                            max_attempts
                        );
                    }
                }
                Err(e) => {
                    let err = AppError::from(e);
                    if last || !err.code.is_retryable() {
                        return Err(err);
                    }
                    warn!(
                        "⚠️ Request to {} failed: {} (attempt {}/{})",
                        host_of(url),
                        err,
                        attempt,
                        max_attempts
                    );
                }
            }

            let delay = self.retry.delay_for(attempt);
            debug!("⏳ Retry {}/{} after {}ms", attempt + 1, max_attempts, delay.as_millis());
            tokio::time::sleep(delay).await;
        }
    }
}

/// Scheme and host only, so logs never carry query strings
fn host_of(url: &str) -> &str {
    let start = url.find("://").map(|i| i + 3).unwrap_or(0);
    let end = url[start..]
        .find(['/', '?'])
        .map(|i| start + i)
        .unwrap_or(url.len());
    &url[..end]
}

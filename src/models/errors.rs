//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so a single grep over the job
//! log (or the hosted runner output) finds it.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - FEED_xxx: Feed fetch/parse errors
//! - SCRAPE_xxx: Article page errors
//! - LLM_xxx: Summary provider errors
//! - NOTION_xxx: Publishing errors
//! - CFG_xxx: Configuration errors
//! - API_xxx / RUN_xxx: Dispatch API and run lifecycle errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Feed Errors (1xx)
    // ============================================
    /// Feed URL could not be fetched
    FeedFetchFailed,
    /// Feed body is not valid RSS/Atom
    FeedParseFailed,

    // ============================================
    // Scrape Errors (2xx)
    // ============================================
    /// Article page request failed
    ScrapeFailed,
    /// Article page had no usable text
    ScrapeEmpty,

    // ============================================
    // Summary Provider Errors (3xx)
    // ============================================
    /// LLM request failed or returned non-success
    LlmRequestFailed,
    /// LLM provider rate limited (HTTP 429)
    LlmRateLimited,
    /// LLM response could not be used
    LlmInvalidResponse,

    // ============================================
    // Notion Errors (4xx)
    // ============================================
    /// Notion request did not complete
    NotionRequestFailed,
    /// Notion answered with a non-200 status
    NotionRejected,

    // ============================================
    // Configuration Errors (5xx)
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,
    /// Config file unreadable or malformed
    ConfigFileInvalid,

    // ============================================
    // Run / API Errors (6xx)
    // ============================================
    /// Another aggregation run holds the run permit
    RunInProgress,
    /// Invalid request format
    ApiBadRequest,
    /// Unauthorized (invalid token)
    ApiUnauthorized,
    /// Resource not found
    ApiNotFound,

    // ============================================
    // Transport Errors (7xx)
    // ============================================
    /// Upstream did not answer in time
    ExternalTimeout,
    /// TCP/TLS connection failed
    ConnectionFailed,

    // ============================================
    // Generic Errors (9xx)
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FeedFetchFailed => "FEED_FETCH_FAILED",
            Self::FeedParseFailed => "FEED_PARSE_FAILED",

            Self::ScrapeFailed => "SCRAPE_FAILED",
            Self::ScrapeEmpty => "SCRAPE_EMPTY",

            Self::LlmRequestFailed => "LLM_REQUEST_FAILED",
            Self::LlmRateLimited => "LLM_RATE_LIMITED",
            Self::LlmInvalidResponse => "LLM_INVALID_RESPONSE",

            Self::NotionRequestFailed => "NOTION_REQUEST_FAILED",
            Self::NotionRejected => "NOTION_REJECTED",

            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::ConfigFileInvalid => "CFG_FILE_INVALID",

            Self::RunInProgress => "RUN_IN_PROGRESS",
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiUnauthorized => "API_UNAUTHORIZED",
            Self::ApiNotFound => "API_NOT_FOUND",

            Self::ExternalTimeout => "EXTERNAL_TIMEOUT",
            Self::ConnectionFailed => "CONNECTION_FAILED",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::ConfigInvalidValue => 400,
            Self::ApiUnauthorized => 401,
            Self::ApiNotFound => 404,
            Self::RunInProgress => 409,
            Self::LlmRateLimited => 429,
            Self::ExternalTimeout => 504,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExternalTimeout | Self::ConnectionFailed | Self::LlmRateLimited
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Feed fetch failed
    pub fn feed_fetch(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::FeedFetchFailed, msg)
    }

    /// Feed parse failed
    pub fn feed_parse(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::FeedParseFailed, msg)
    }

    /// Scrape failed
    pub fn scrape_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ScrapeFailed, msg)
    }

    /// LLM request failed
    pub fn llm_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::LlmRequestFailed, msg)
    }

    /// LLM response unusable
    pub fn llm_invalid(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::LlmInvalidResponse, msg)
    }

    /// Notion rejected the page
    pub fn notion_rejected(status: u16, body: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::NotionRejected,
            format!("Notion API error {}: {}", status, body.into()),
        )
    }

    /// Missing environment variable
    pub fn missing_env(key_name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingEnv,
            format!("Missing environment variable: {}", key_name),
        )
    }

    /// Invalid config value
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }

    /// A run already holds the permit
    pub fn run_in_progress() -> Self {
        Self::new(ErrorCode::RunInProgress, "An aggregation run is already in progress")
    }

    /// API request could not be parsed
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// API unauthorized
    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::ApiUnauthorized, "Invalid or missing API token")
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::ExternalTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::ConnectionFailed, "Connection failed")
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::LlmInvalidResponse, "JSON parse error", err)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::with_source(ErrorCode::ConfigFileInvalid, "Config file is not valid TOML", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::missing_env("NOTION_TOKEN");
        assert_eq!(err.code, ErrorCode::ConfigMissingEnv);
        assert_eq!(err.code_str(), "CFG_MISSING_ENV");
        assert_eq!(err.to_string(), "[CFG_MISSING_ENV] Missing environment variable: NOTION_TOKEN");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::ExternalTimeout.is_retryable());
        assert!(ErrorCode::ConnectionFailed.is_retryable());
        assert!(ErrorCode::LlmRateLimited.is_retryable());
        assert!(!ErrorCode::NotionRejected.is_retryable());
        assert!(!ErrorCode::ConfigMissingEnv.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ApiBadRequest.http_status(), 400);
        assert_eq!(ErrorCode::ApiUnauthorized.http_status(), 401);
        assert_eq!(ErrorCode::RunInProgress.http_status(), 409);
        assert_eq!(ErrorCode::LlmRateLimited.http_status(), 429);
        assert_eq!(ErrorCode::FeedFetchFailed.http_status(), 500);
    }

    #[test]
    fn test_toml_error_maps_to_config_file() {
        let err: AppError = toml::from_str::<toml::Value>("= nope").unwrap_err().into();
        assert_eq!(err.code, ErrorCode::ConfigFileInvalid);
    }
}

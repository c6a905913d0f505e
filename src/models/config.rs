//! Configuration module for the Article Aggregator
//!
//! Layering: built-in defaults < optional TOML file (`AGGREGATOR_CONFIG`)
//! < environment variables. Secrets are read from the environment only.
//! Defaults come from utils/constants.rs.

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::prompts::PromptStyle;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::FeedSource;
use crate::utils::constants::{
    DEFAULT_API_HOST, DEFAULT_API_PORT, DEFAULT_ARTICLE_DELAY_MS, DEFAULT_BASE_RETRY_MS,
    DEFAULT_FEEDS, DEFAULT_GROQ_MODEL, DEFAULT_HOURS_BACK, DEFAULT_MAX_RETRIES,
    DEFAULT_MAX_RETRY_MS, DEFAULT_OPENAI_MODEL, DEFAULT_PUBLISH_DELAY_MS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SCHEDULE, DEFAULT_SEEN_TTL_SECS, GROQ_API_URL,
    HUGGINGFACE_MODEL_URL, MAX_HOURS_BACK, NOTION_API_URL, OPENAI_API_URL, RETRY_JITTER_PERCENT,
};
use crate::utils::cron::parse_cron;

// ============================================
// Environment keys
// ============================================

pub const ENV_NOTION_TOKEN: &str = "NOTION_TOKEN";
pub const ENV_NOTION_DATABASE_ID: &str = "NOTION_DATABASE_ID";
pub const ENV_HUGGINGFACE_TOKEN: &str = "HUGGINGFACE_TOKEN";
pub const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_CONFIG_PATH: &str = "AGGREGATOR_CONFIG";

/// Credential string that never shows up in logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value, only for building request headers
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Credentials injected by the CI host (or `.env`)
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub notion_token: Option<Secret>,
    pub notion_database_id: Option<String>,
    pub huggingface_token: Option<Secret>,
    pub groq_api_key: Option<Secret>,
    pub openai_api_key: Option<Secret>,
}

/// Outbound API endpoints; overridable so tests can point at local servers
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub groq: String,
    pub openai: String,
    pub huggingface: String,
    pub notion: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            groq: GROQ_API_URL.to_string(),
            openai: OPENAI_API_URL.to_string(),
            huggingface: HUGGINGFACE_MODEL_URL.to_string(),
            notion: NOTION_API_URL.to_string(),
        }
    }
}

/// Exponential backoff with jitter for outbound HTTP
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_percent: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_RETRY_MS,
            max_delay_ms: DEFAULT_MAX_RETRY_MS,
            jitter_percent: RETRY_JITTER_PERCENT,
        }
    }
}

impl RetryPolicy {
    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Optional on-disk overrides (TOML)
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub hours_back: Option<i64>,
    pub dry_run: Option<bool>,
    pub prompt_style: Option<String>,
    pub schedule: Option<String>,
    pub article_delay_ms: Option<u64>,
    pub publish_delay_ms: Option<u64>,
    pub groq_model: Option<String>,
    pub openai_model: Option<String>,
    pub huggingface_model_url: Option<String>,
    pub api_host: Option<String>,
    pub api_port: Option<u16>,
    pub sources: Option<Vec<FeedSource>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::with_source(
                ErrorCode::ConfigFileInvalid,
                format!("Cannot read config file {}", path.display()),
                e,
            )
        })?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Full runtime configuration
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub secrets: Secrets,
    pub sources: Vec<FeedSource>,
    pub hours_back: i64,
    pub dry_run: bool,
    pub prompt_style: PromptStyle,
    /// 5-field cron, UTC
    pub schedule: String,
    pub article_delay: Duration,
    pub publish_delay: Duration,
    pub request_timeout: Duration,
    pub seen_ttl: Duration,
    pub retry: RetryPolicy,
    pub groq_model: String,
    pub openai_model: String,
    pub endpoints: Endpoints,
    pub api_token: Option<Secret>,
    pub api_host: String,
    pub api_port: u16,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            secrets: Secrets::default(),
            sources: DEFAULT_FEEDS
                .iter()
                .map(|(category, url)| FeedSource::new(*category, *url))
                .collect(),
            hours_back: DEFAULT_HOURS_BACK,
            dry_run: false,
            prompt_style: PromptStyle::default(),
            schedule: DEFAULT_SCHEDULE.to_string(),
            article_delay: Duration::from_millis(DEFAULT_ARTICLE_DELAY_MS),
            publish_delay: Duration::from_millis(DEFAULT_PUBLISH_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            seen_ttl: Duration::from_secs(DEFAULT_SEEN_TTL_SECS),
            retry: RetryPolicy::default(),
            groq_model: DEFAULT_GROQ_MODEL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            endpoints: Endpoints::default(),
            api_token: None,
            api_host: DEFAULT_API_HOST.to_string(),
            api_port: DEFAULT_API_PORT,
        }
    }
}

impl AggregatorConfig {
    /// Load `.env`, the optional TOML file, then the process environment
    pub fn from_env() -> AppResult<Self> {
        if dotenvy::dotenv().is_ok() {
            info!("📄 Loaded .env file");
        }

        let file = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) if !path.trim().is_empty() => {
                info!("📄 Loading config file {}", path);
                FileConfig::load(Path::new(&path))?
            }
            _ => FileConfig::default(),
        };

        Self::from_lookup(|key| std::env::var(key).ok(), file)
    }

    /// Build from any key lookup (process env in production, a map in tests)
    pub fn from_lookup<F>(lookup: F, file: FileConfig) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosted CI passes unset secrets as empty strings
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let secret = |key: &str| get(key).map(Secret::new);

        let mut config = Self::default();

        // ---- file layer ----
        if let Some(sources) = file.sources {
            config.sources = sources;
        }
        if let Some(v) = file.hours_back {
            config.hours_back = v;
        }
        if let Some(v) = file.dry_run {
            config.dry_run = v;
        }
        if let Some(v) = file.prompt_style {
            config.prompt_style = v.parse()?;
        }
        if let Some(v) = file.schedule {
            config.schedule = v;
        }
        if let Some(v) = file.article_delay_ms {
            config.article_delay = Duration::from_millis(v);
        }
        if let Some(v) = file.publish_delay_ms {
            config.publish_delay = Duration::from_millis(v);
        }
        if let Some(v) = file.groq_model {
            config.groq_model = v;
        }
        if let Some(v) = file.openai_model {
            config.openai_model = v;
        }
        if let Some(v) = file.huggingface_model_url {
            config.endpoints.huggingface = v;
        }
        if let Some(v) = file.api_host {
            config.api_host = v;
        }
        if let Some(v) = file.api_port {
            config.api_port = v;
        }

        // ---- environment layer ----
        config.secrets = Secrets {
            notion_token: secret(ENV_NOTION_TOKEN),
            notion_database_id: get(ENV_NOTION_DATABASE_ID),
            huggingface_token: secret(ENV_HUGGINGFACE_TOKEN),
            groq_api_key: secret(ENV_GROQ_API_KEY),
            openai_api_key: secret(ENV_OPENAI_API_KEY),
        };

        if let Some(v) = get("AGGREGATOR_HOURS_BACK") {
            config.hours_back = parse_number("AGGREGATOR_HOURS_BACK", &v)?;
        }
        if let Some(v) = get("AGGREGATOR_DRY_RUN") {
            config.dry_run = parse_bool("AGGREGATOR_DRY_RUN", &v)?;
        }
        if let Some(v) = get("AGGREGATOR_PROMPT_STYLE") {
            config.prompt_style = v.parse()?;
        }
        if let Some(v) = get("AGGREGATOR_SCHEDULE") {
            config.schedule = v;
        }
        if let Some(v) = get("AGGREGATOR_ARTICLE_DELAY_MS") {
            config.article_delay =
                Duration::from_millis(parse_number("AGGREGATOR_ARTICLE_DELAY_MS", &v)?);
        }
        if let Some(v) = get("AGGREGATOR_PUBLISH_DELAY_MS") {
            config.publish_delay =
                Duration::from_millis(parse_number("AGGREGATOR_PUBLISH_DELAY_MS", &v)?);
        }
        if let Some(v) = get("GROQ_MODEL") {
            config.groq_model = v;
        }
        if let Some(v) = get("OPENAI_MODEL") {
            config.openai_model = v;
        }
        if let Some(v) = get("GROQ_API_URL") {
            config.endpoints.groq = v;
        }
        if let Some(v) = get("OPENAI_API_URL") {
            config.endpoints.openai = v;
        }
        if let Some(v) = get("HUGGINGFACE_MODEL_URL") {
            config.endpoints.huggingface = v;
        }
        if let Some(v) = get("NOTION_API_URL") {
            config.endpoints.notion = v;
        }

        config.api_token = secret("AGGREGATOR_API_TOKEN");
        if let Some(v) = get("AGGREGATOR_API_HOST") {
            config.api_host = v;
        }
        // Platform PORT wins over our own key only when ours is unset
        let port = get("AGGREGATOR_API_PORT")
            .map(|v| ("AGGREGATOR_API_PORT", v))
            .or_else(|| get("PORT").map(|v| ("PORT", v)));
        if let Some((key, v)) = port {
            config.api_port = parse_number(key, &v)?;
        }

        config.validate()?;
        config.log_summary();
        Ok(config)
    }

    /// Reject configurations that cannot produce a useful run
    pub fn validate(&self) -> AppResult<()> {
        if self.sources.is_empty() {
            return Err(AppError::invalid_config("At least one feed source is required"));
        }
        if let Some(bad) = self
            .sources
            .iter()
            .find(|s| s.url.trim().is_empty() || s.category.trim().is_empty())
        {
            return Err(AppError::invalid_config(format!(
                "Feed source needs both category and url: {:?}",
                bad
            )));
        }
        if self.hours_back <= 0 || self.hours_back > MAX_HOURS_BACK {
            return Err(AppError::invalid_config(format!(
                "hours_back must be between 1 and {}, got {}",
                MAX_HOURS_BACK, self.hours_back
            )));
        }
        parse_cron(&self.schedule).map_err(|e| {
            AppError::invalid_config(format!("Invalid schedule '{}': {}", self.schedule, e))
        })?;

        if !self.dry_run {
            if self.secrets.notion_token.is_none() {
                return Err(AppError::missing_env(ENV_NOTION_TOKEN));
            }
            if self.secrets.notion_database_id.is_none() {
                return Err(AppError::missing_env(ENV_NOTION_DATABASE_ID));
            }
        }
        Ok(())
    }

    /// Log which providers are live; secret values are never printed
    fn log_summary(&self) {
        info!(
            "⚙️  {} feeds | lookback {}h | schedule '{}' UTC | prompt {} | dry_run {}",
            self.sources.len(),
            self.hours_back,
            self.schedule,
            self.prompt_style.as_str(),
            self.dry_run
        );
        let flag = |present: bool| if present { "configured" } else { "missing" };
        info!(
            "🔑 Groq: {} | OpenAI: {} | HuggingFace: {} | Notion: {}",
            flag(self.secrets.groq_api_key.is_some()),
            flag(self.secrets.openai_api_key.is_some()),
            flag(self.secrets.huggingface_token.is_some()),
            flag(self.secrets.notion_token.is_some()),
        );
        if self.secrets.groq_api_key.is_none()
            && self.secrets.openai_api_key.is_none()
            && self.secrets.huggingface_token.is_none()
        {
            warn!("⚠️ No LLM provider configured; summaries will be extractive only");
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> AppResult<T> {
    value
        .parse()
        .map_err(|_| AppError::invalid_config(format!("{} must be a number, got '{}'", key, value)))
}

fn parse_bool(key: &str, value: &str) -> AppResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::invalid_config(format!(
            "{} must be a boolean, got '{}'",
            key, value
        ))),
    }
}

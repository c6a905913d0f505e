//! Constants Module - Single Source of Truth
//!
//! Endpoints, limits, default feeds and timing knobs used across the
//! pipeline. Other modules reference these instead of inlining values.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "ArticleAggregator";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for API calls (LLM providers, Notion)
pub const USER_AGENT: &str = concat!("ArticleAggregator/", env!("CARGO_PKG_VERSION"));

/// Browser User-Agent for article pages; many publishers block bot agents
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

// ============================================
// SCHEDULE
// ============================================

/// Daily at 01:00 UTC
pub const DEFAULT_SCHEDULE: &str = "0 1 * * *";

/// Lookback window for feed entries (hours)
pub const DEFAULT_HOURS_BACK: i64 = 24;

/// Lookback cap (one year)
pub const MAX_HOURS_BACK: i64 = DEFAULT_HOURS_BACK * 365;

/// Pause after each processed article (ms)
pub const DEFAULT_ARTICLE_DELAY_MS: u64 = 1000;

/// Pause after each Notion write (ms)
pub const DEFAULT_PUBLISH_DELAY_MS: u64 = 500;

/// How long a published URL stays in the duplicate cache (seconds)
pub const DEFAULT_SEEN_TTL_SECS: u64 = 48 * 3600;

// ============================================
// TIMEOUTS & RETRY
// ============================================

/// Feed and API request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Article page timeout (seconds)
pub const SCRAPE_TIMEOUT_SECS: u64 = 15;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_RETRY_MS: u64 = 500;
pub const DEFAULT_MAX_RETRY_MS: u64 = 8000;
pub const RETRY_JITTER_PERCENT: u64 = 20;

// ============================================
// TEXT LIMITS (characters)
// ============================================

pub const DESCRIPTION_MAX_CHARS: usize = 200;
pub const SCRAPED_CONTENT_MAX_CHARS: usize = 4000;
pub const SCRAPED_LINE_MIN_CHARS: usize = 20;
pub const GROQ_CONTENT_MAX_CHARS: usize = 3000;
pub const OPENAI_CONTENT_MAX_CHARS: usize = 1500;
pub const HUGGINGFACE_CONTENT_MAX_CHARS: usize = 800;

/// Notion rejects rich_text/title content longer than this
pub const NOTION_TEXT_MAX_CHARS: usize = 2000;

/// Bullet items shorter than this are dropped
pub const BULLET_MIN_CHARS: usize = 15;
/// Sentences shorter than this are dropped
pub const SENTENCE_MIN_CHARS: usize = 20;
pub const MAX_SUMMARY_BULLETS: usize = 4;
pub const EXTRACTIVE_MAX_BULLETS: usize = 3;
/// Below this word count the extractive summary gives up
pub const EXTRACTIVE_MIN_WORDS: usize = 50;

// ============================================
// PROVIDER ENDPOINTS
// ============================================

pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

pub const HUGGINGFACE_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/microsoft/DialoGPT-medium";

pub const NOTION_API_URL: &str = "https://api.notion.com";
pub const NOTION_VERSION: &str = "2022-06-28";

// ============================================
// SCRAPER SELECTORS
// ============================================

/// Tried in order; first selector with any match wins
pub const CONTENT_SELECTORS: [&str; 10] = [
    "article",
    "[role=\"main\"]",
    ".post-content",
    ".entry-content",
    ".article-content",
    ".content",
    ".post-body",
    ".story-body",
    "main",
    ".main-content",
];

/// Elements whose text never counts as article content
pub const STRIPPED_ELEMENTS: [&str; 10] = [
    "script",
    "style",
    "nav",
    "header",
    "footer",
    "sidebar",
    "advertisement",
    "ads",
    "noscript",
    "aside",
];

/// Elements after which a line break is inserted during text extraction
pub const BLOCK_ELEMENTS: [&str; 17] = [
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
    "tr", "blockquote", "pre",
];

// ============================================
// DEFAULT FEEDS
// ============================================

pub const CATEGORY_TECH: &str = "Tech";
pub const CATEGORY_HEALTH: &str = "Health";

/// (category, feed url)
pub const DEFAULT_FEEDS: [(&str, &str); 7] = [
    (CATEGORY_TECH, "https://techcrunch.com/feed/"),
    (CATEGORY_TECH, "https://openai.com/blog/rss.xml"),
    (CATEGORY_TECH, "https://www.lennysnewsletter.com/feed"),
    (CATEGORY_HEALTH, "https://www.medicalnewstoday.com/feeds/news.xml"),
    (CATEGORY_HEALTH, "https://www.mobihealthnews.com/feed/"),
    (CATEGORY_HEALTH, "https://www.fiercehealthcare.com/rss.xml"),
    (CATEGORY_HEALTH, "https://medcitynews.com/feed/"),
];

// ============================================
// API SERVER
// ============================================

pub const DEFAULT_API_HOST: &str = "0.0.0.0";
pub const DEFAULT_API_PORT: u16 = 8080;

/// Run reports kept in memory for /v1/runs
pub const RUN_HISTORY_CAPACITY: usize = 50;

/// Telemetry export directory
pub const TELEMETRY_DIR: &str = "./telemetry";

//! Providers Module - External Services
//!
//! Feeds, article pages, LLM summarizers and Notion, all on top of the
//! shared retrying HTTP transport.

pub mod feed;
pub mod http;
pub mod llm;
pub mod notion;
pub mod scraper;

pub use feed::FeedClient;
pub use http::HttpTransport;
pub use llm::{ChatCompletionSummarizer, HuggingFaceSummarizer, Summarizer};
pub use notion::NotionClient;
pub use scraper::ArticleScraper;

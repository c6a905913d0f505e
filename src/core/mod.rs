//! Core Module - Pipeline Logic
//!
//! The aggregation run, the summary provider chain, prompt styles and the
//! cron-driven scheduler.

pub mod aggregator;
pub mod prompts;
pub mod scheduler;
pub mod summarizer;

pub use aggregator::{ArticleAggregator, RunPermit};
pub use prompts::PromptStyle;
pub use scheduler::run_scheduler;
pub use summarizer::SummaryChain;

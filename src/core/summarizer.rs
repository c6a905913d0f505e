//! Provider chain
//!
//! Configured providers are tried in order (Groq, OpenAI, HuggingFace).
//! The first usable output wins; if all fail, the extractive summary is
//! used, so `summarize` always yields something.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::config::AggregatorConfig;
use crate::models::types::{Summary, SummarySource};
use crate::providers::http::HttpTransport;
use crate::providers::llm::{ChatCompletionSummarizer, HuggingFaceSummarizer, Summarizer};
use crate::utils::text::extractive_summary;

pub struct SummaryChain {
    providers: Vec<Arc<dyn Summarizer>>,
}

impl SummaryChain {
    pub fn new(providers: Vec<Arc<dyn Summarizer>>) -> Self {
        Self { providers }
    }

    /// Providers whose credentials are present, in fallback order
    pub fn from_config(config: &AggregatorConfig, http: &HttpTransport) -> Self {
        let secrets = &config.secrets;
        let mut providers: Vec<Arc<dyn Summarizer>> = Vec::new();

        if let Some(key) = &secrets.groq_api_key {
            providers.push(Arc::new(ChatCompletionSummarizer::groq(
                http.clone(),
                config.endpoints.groq.clone(),
                key.clone(),
                config.groq_model.clone(),
                config.prompt_style,
            )));
        }
        if let Some(key) = &secrets.openai_api_key {
            providers.push(Arc::new(ChatCompletionSummarizer::openai(
                http.clone(),
                config.endpoints.openai.clone(),
                key.clone(),
                config.openai_model.clone(),
                config.prompt_style,
            )));
        }
        if let Some(token) = &secrets.huggingface_token {
            providers.push(Arc::new(HuggingFaceSummarizer::new(
                http.clone(),
                config.endpoints.huggingface.clone(),
                token.clone(),
                config.prompt_style,
            )));
        }

        info!(
            "🤖 Summary chain: [{}] + extractive",
            providers
                .iter()
                .map(|p| p.source().as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.source().as_str()).collect()
    }

    pub async fn summarize(&self, title: &str, content: &str) -> Summary {
        for provider in &self.providers {
            let source = provider.source();
            match provider.summarize(title, content).await {
                Ok(text) => {
                    debug!("✅ {} summarized '{}'", source.as_str(), title);
                    return Summary { text, source };
                }
                Err(e) => {
                    warn!("⚠️ {} failed for '{}': {}", source.as_str(), title, e);
                }
            }
        }

        Summary {
            text: extractive_summary(content, title),
            source: SummarySource::Extractive,
        }
    }
}

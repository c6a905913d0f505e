//! LLM summary providers
//!
//! Groq and OpenAI share the chat-completions wire format; HuggingFace
//! inference takes a single prompt. Each provider returns already
//! normalized bullets, or an error when the output is unusable.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::core::prompts::PromptStyle;
use crate::models::config::Secret;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::SummarySource;
use crate::providers::http::HttpTransport;
use crate::utils::constants::{
    GROQ_CONTENT_MAX_CHARS, HUGGINGFACE_CONTENT_MAX_CHARS, OPENAI_CONTENT_MAX_CHARS,
};
use crate::utils::text::{clean_and_format_summary, truncate_chars};

/// Max characters of an error body kept in log messages
const ERROR_BODY_PREVIEW: usize = 300;

#[async_trait]
pub trait Summarizer: Send + Sync {
    fn source(&self) -> SummarySource;

    /// Bullet summary of one article
    async fn summarize(&self, title: &str, content: &str) -> AppResult<String>;
}

pub(crate) fn bearer_headers(token: &Secret) -> AppResult<HeaderMap> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
        .map_err(|_| AppError::invalid_config("API token contains invalid header characters"))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

/// Map a non-2xx provider response to an error (body preview included)
async fn status_error(provider: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let preview = truncate_chars(&body, ERROR_BODY_PREVIEW);
    let code = if status.as_u16() == 429 {
        ErrorCode::LlmRateLimited
    } else {
        ErrorCode::LlmRequestFailed
    };
    AppError::new(code, format!("{} API error {}: {}", provider, status, preview))
}

fn normalized(provider: &str, raw: &str) -> AppResult<String> {
    let summary = clean_and_format_summary(raw);
    if summary.is_empty() {
        return Err(AppError::llm_invalid(format!(
            "{} returned no usable bullets",
            provider
        )));
    }
    Ok(summary)
}

// ============================================
// Chat completions (Groq, OpenAI)
// ============================================

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// How the user turn is phrased
#[derive(Debug, Clone, Copy)]
enum UserPrompt {
    /// Long executive-summary framing
    Executive,
    /// Short title/content framing
    Plain,
}

impl UserPrompt {
    fn render(self, title: &str, content: &str) -> String {
        match self {
            UserPrompt::Executive => format!(
                "Analyze this article and create a 3-4 bullet executive summary focusing on key business insights and data points:\n\nTITLE: {}\n\nARTICLE CONTENT:\n{}\n\nExecutive Summary:",
                title, content
            ),
            UserPrompt::Plain => format!(
                "Article Title: {}\n\nContent: {}\n\nProvide a 3-4 bullet point summary:",
                title, content
            ),
        }
    }
}

pub struct ChatCompletionSummarizer {
    http: HttpTransport,
    source: SummarySource,
    url: String,
    api_key: Secret,
    model: String,
    system_prompt: &'static str,
    user_prompt: UserPrompt,
    max_content_chars: usize,
    max_tokens: u32,
    temperature: f64,
    top_p: Option<f64>,
}

impl ChatCompletionSummarizer {
    /// Groq: full prompt, 3000 chars of content, near-deterministic sampling
    pub fn groq(
        http: HttpTransport,
        url: impl Into<String>,
        api_key: Secret,
        model: impl Into<String>,
        style: PromptStyle,
    ) -> Self {
        Self {
            http,
            source: SummarySource::Groq,
            url: url.into(),
            api_key,
            model: model.into(),
            system_prompt: style.system_prompt(),
            user_prompt: UserPrompt::Executive,
            max_content_chars: GROQ_CONTENT_MAX_CHARS,
            max_tokens: 300,
            temperature: 0.1,
            top_p: Some(0.9),
        }
    }

    pub fn openai(
        http: HttpTransport,
        url: impl Into<String>,
        api_key: Secret,
        model: impl Into<String>,
        style: PromptStyle,
    ) -> Self {
        Self {
            http,
            source: SummarySource::OpenAi,
            url: url.into(),
            api_key,
            model: model.into(),
            system_prompt: style.compact_system_prompt(),
            user_prompt: UserPrompt::Plain,
            max_content_chars: OPENAI_CONTENT_MAX_CHARS,
            max_tokens: 200,
            temperature: 0.3,
            top_p: None,
        }
    }

    fn request_body(&self, title: &str, content: &str) -> serde_json::Value {
        let content = truncate_chars(content, self.max_content_chars);
        let mut body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": self.system_prompt},
                {"role": "user", "content": self.user_prompt.render(title, content)},
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });
        if let Some(top_p) = self.top_p {
            body["top_p"] = json!(top_p);
        }
        body
    }
}

#[async_trait]
impl Summarizer for ChatCompletionSummarizer {
    fn source(&self) -> SummarySource {
        self.source
    }

    async fn summarize(&self, title: &str, content: &str) -> AppResult<String> {
        let provider = self.source.as_str();
        let body = self.request_body(title, content);
        let response = self
            .http
            .post_json(&self.url, bearer_headers(&self.api_key)?, &body)
            .await
            .map_err(|e| AppError::llm_failed(format!("{} request failed: {}", provider, e)))?;

        if !response.status().is_success() {
            return Err(status_error(provider, response).await);
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            AppError::llm_invalid(format!("{} response is not valid JSON: {}", provider, e))
        })?;
        let raw = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::llm_invalid(format!("{} returned no choices", provider)))?;

        debug!("🤖 {} raw output: {} chars", provider, raw.chars().count());
        normalized(provider, &raw)
    }
}

// ============================================
// HuggingFace inference
// ============================================

#[derive(Debug, Deserialize)]
struct GeneratedText {
    #[serde(default)]
    generated_text: String,
}

pub struct HuggingFaceSummarizer {
    http: HttpTransport,
    url: String,
    token: Secret,
    style: PromptStyle,
}

impl HuggingFaceSummarizer {
    pub fn new(http: HttpTransport, url: impl Into<String>, token: Secret, style: PromptStyle) -> Self {
        Self {
            http,
            url: url.into(),
            token,
            style,
        }
    }

    fn request_body(&self, title: &str, content: &str) -> serde_json::Value {
        let prompt = format!(
            "{}\n\nArticle Title: {}\n\nArticle Content: {}\n\nSummary:",
            self.style.instruction(),
            title,
            truncate_chars(content, HUGGINGFACE_CONTENT_MAX_CHARS)
        );
        json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": 200,
                "temperature": 0.7,
                "return_full_text": false,
            }
        })
    }
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    fn source(&self) -> SummarySource {
        SummarySource::HuggingFace
    }

    async fn summarize(&self, title: &str, content: &str) -> AppResult<String> {
        let provider = SummarySource::HuggingFace.as_str();
        let body = self.request_body(title, content);
        let response = self
            .http
            .post_json(&self.url, bearer_headers(&self.token)?, &body)
            .await
            .map_err(|e| AppError::llm_failed(format!("{} request failed: {}", provider, e)))?;

        if !response.status().is_success() {
            return Err(status_error(provider, response).await);
        }

        // A model still loading answers 200 with an object instead of a list
        let parsed: Vec<GeneratedText> = response.json().await.map_err(|e| {
            AppError::llm_invalid(format!("{} response is not a generation list: {}", provider, e))
        })?;
        let raw = parsed
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| AppError::llm_invalid(format!("{} returned an empty list", provider)))?;

        normalized(provider, &raw)
    }
}

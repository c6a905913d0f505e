//! Prompt styles for LLM summaries
//!
//! Every style asks for 3-4 bullets; they differ in which facts the model
//! is told to surface. `product_manager` is the default and carries a worked
//! example, which keeps low-temperature models on format.

use std::str::FromStr;

use crate::models::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptStyle {
    #[default]
    ProductManager,
    Investor,
    TechExecutive,
    Simple,
}

const PRODUCT_MANAGER_PROMPT: &str = "You are an expert product manager and business analyst. Your job is to read articles and create executive summaries that highlight:

1. Key business metrics, numbers, and data points (revenue, users, growth %, etc.)
2. Strategic decisions and their business impact
3. Market trends and competitive advantages
4. Technology breakthroughs with quantifiable benefits

Format your response as exactly 3-4 bullet points. Each bullet should:
- Start with the most important insight or number
- Be specific and quantifiable when possible
- Focus on business impact, not just features
- Be concise but informative (15-25 words per bullet)

Example format:
• Revenue increased 47% to $2.1B driven by enterprise AI adoption among Fortune 500 companies
• New feature reduces customer churn by 23% through predictive analytics, saving $45M annually
• Strategic partnership with Microsoft expands market reach to 150M potential enterprise users";

const INVESTOR_PROMPT: &str = "You are a venture capital analyst. Focus on:
1. Market size and growth opportunities
2. Competitive positioning and moats
3. Revenue models and unit economics
4. Risk factors and regulatory concerns

Format as 3-4 bullet points highlighting investment implications.";

const TECH_EXECUTIVE_PROMPT: &str = "You are a CTO analyzing technical developments. Focus on:
1. Technical innovations and their business impact
2. Performance improvements with specific metrics
3. Architecture decisions and scalability implications
4. Security, compliance, and operational considerations

Format as 3-4 bullet points with technical depth and business context.";

const SIMPLE_PROMPT: &str = "Summarize this article in 3-4 clear bullet points that anyone can understand. Focus on:
1. What happened (the main news)
2. Why it matters (the impact)
3. Key numbers or facts
4. What happens next (if mentioned)

Be specific and use numbers when available.";

/// Short variant for providers with a tighter token budget
const PRODUCT_MANAGER_COMPACT: &str =
    "You are an expert product manager. Summarize articles in exactly 3-4 bullet points, highlighting key data points.";

impl PromptStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptStyle::ProductManager => "product_manager",
            PromptStyle::Investor => "investor",
            PromptStyle::TechExecutive => "tech_executive",
            PromptStyle::Simple => "simple",
        }
    }

    /// Full system prompt (Groq)
    pub fn system_prompt(&self) -> &'static str {
        match self {
            PromptStyle::ProductManager => PRODUCT_MANAGER_PROMPT,
            PromptStyle::Investor => INVESTOR_PROMPT,
            PromptStyle::TechExecutive => TECH_EXECUTIVE_PROMPT,
            PromptStyle::Simple => SIMPLE_PROMPT,
        }
    }

    /// System prompt without the worked example (OpenAI)
    pub fn compact_system_prompt(&self) -> &'static str {
        match self {
            PromptStyle::ProductManager => PRODUCT_MANAGER_COMPACT,
            other => other.system_prompt(),
        }
    }

    /// Lead-in sentence for single-prompt models (HuggingFace)
    pub fn instruction(&self) -> &'static str {
        match self {
            PromptStyle::ProductManager => "As an expert product manager, read through the article and summarize the article in 3 or 4 bullet points, highlighting key data points if any.",
            PromptStyle::Investor => "As a venture capital analyst, summarize the article in 3 or 4 bullet points, highlighting investment implications.",
            PromptStyle::TechExecutive => "As a CTO, summarize the article in 3 or 4 bullet points, highlighting technical impact and metrics.",
            PromptStyle::Simple => "Summarize the article in 3 or 4 clear bullet points that anyone can understand.",
        }
    }
}

impl FromStr for PromptStyle {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "product_manager" => Ok(PromptStyle::ProductManager),
            "investor" => Ok(PromptStyle::Investor),
            "tech_executive" => Ok(PromptStyle::TechExecutive),
            "simple" => Ok(PromptStyle::Simple),
            other => Err(AppError::invalid_config(format!(
                "Unknown prompt style '{}' (expected product_manager, investor, tech_executive or simple)",
                other
            ))),
        }
    }
}

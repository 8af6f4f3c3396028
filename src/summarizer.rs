//! Three-part article analysis through the chat model.
//!
//! The model is asked for exactly three sentences separated by `|`:
//! key takeaway, impact, and why it matters. Whatever comes back, the
//! caller always receives a complete [`Summary`]:
//!
//! | Outcome | Result | Log level |
//! |---------|--------|-----------|
//! | three non-empty segments | the segments, trimmed | - |
//! | any other shape | [`parse_fallback`] | warn |
//! | call failed | [`call_fallback`] | error |
//!
//! A model failure never blocks publishing.

use crate::chat::{ChatCompletion, ChatMessage, ChatRequest};
use crate::config::ChatSettings;
use crate::models::{Article, Summary};
use crate::utils::truncate_chars;
use thiserror::Error;
use tracing::{error, instrument, warn};

const SYSTEM_PROMPT: &str = "You are an AI expert analyzing tech news. Be concise and insightful. Always respond in the exact format requested, using | as separators.";

const PROMPT_TEMPLATE: &str = "Analyze this AI news article and provide exactly three parts, separated by '|' characters:

1. Key takeaway (one clear sentence)
2. Impact on industry/society (one clear sentence)
3. Why it matters for professionals (one clear sentence)

Important: Your response MUST follow this EXACT format:
[Key takeaway sentence] | [Impact sentence] | [Why it matters sentence]

Example format:
New AI model achieves breakthrough in medical diagnosis | This advancement could revolutionize healthcare delivery worldwide | Medical professionals can now diagnose conditions with greater accuracy and speed.

Article to analyze:
";

const TAKEAWAY_PREVIEW_CHARS: usize = 100;

const PARSE_FALLBACK_IMPACT: &str =
    "This development could have significant implications for the AI industry.";
const PARSE_FALLBACK_WHY: &str =
    "Professionals should monitor these developments to stay competitive.";

const CALL_FALLBACK_TAKEAWAY: &str =
    "This article discusses important developments in AI technology.";
const CALL_FALLBACK_IMPACT: &str =
    "These developments could significantly influence the AI landscape.";
const CALL_FALLBACK_WHY: &str =
    "Staying informed about AI advancements is crucial for professional growth.";

/// Why a model response could not be used as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryParseError {
    #[error("expected 3 '|'-separated segments, got {0}")]
    SegmentCount(usize),
    #[error("segment {0} is empty")]
    EmptySegment(usize),
}

/// Split a model response into a [`Summary`].
pub fn parse_summary(raw: &str) -> Result<Summary, SummaryParseError> {
    let parts = raw.trim().split('|').map(str::trim).collect::<Vec<_>>();
    let [takeaway, impact, why_matters] = parts.as_slice() else {
        return Err(SummaryParseError::SegmentCount(parts.len()));
    };
    if let Some(i) = parts.iter().position(|p| p.is_empty()) {
        return Err(SummaryParseError::EmptySegment(i + 1));
    }
    Ok(Summary {
        takeaway: takeaway.to_string(),
        impact: impact.to_string(),
        why_matters: why_matters.to_string(),
    })
}

/// Summary used when the model answered in the wrong shape.
///
/// The takeaway keeps the first 100 characters of what the model did say.
pub fn parse_fallback(raw: &str) -> Summary {
    let raw = raw.trim();
    let takeaway = if raw.is_empty() {
        CALL_FALLBACK_TAKEAWAY.to_string()
    } else if raw.chars().count() > TAKEAWAY_PREVIEW_CHARS {
        format!("{}...", truncate_chars(raw, TAKEAWAY_PREVIEW_CHARS))
    } else {
        raw.to_string()
    };
    Summary {
        takeaway,
        impact: PARSE_FALLBACK_IMPACT.to_string(),
        why_matters: PARSE_FALLBACK_WHY.to_string(),
    }
}

/// Summary used when the model could not be reached at all.
pub fn call_fallback() -> Summary {
    Summary {
        takeaway: CALL_FALLBACK_TAKEAWAY.to_string(),
        impact: CALL_FALLBACK_IMPACT.to_string(),
        why_matters: CALL_FALLBACK_WHY.to_string(),
    }
}

/// Produces a [`Summary`] for each article using a [`ChatCompletion`] model.
#[derive(Debug)]
pub struct Summarizer<M> {
    model: M,
    settings: ChatSettings,
}

impl<M: ChatCompletion> Summarizer<M> {
    pub fn new(model: M, settings: ChatSettings) -> Self {
        Self { model, settings }
    }

    #[cfg(test)]
    pub(crate) fn model(&self) -> &M {
        &self.model
    }

    /// The chat request sent for `article`.
    pub fn request_for(&self, article: &Article) -> ChatRequest {
        ChatRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(format!("{}{}", PROMPT_TEMPLATE, article.analysis_text())),
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }

    /// Analyze one article. Never fails; see the module docs for fallbacks.
    #[instrument(level = "info", skip_all, fields(url = %article.url))]
    pub async fn analyze(&self, article: &Article) -> Summary {
        match self.model.complete(&self.request_for(article)).await {
            Ok(raw) => match parse_summary(&raw) {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(
                        error = %e,
                        response_preview = %truncate_chars(raw.trim(), 300),
                        "Unexpected response format from model; using fallback summary"
                    );
                    parse_fallback(&raw)
                }
            },
            Err(e) => {
                error!(error = %e, "Model call failed; using generic summary");
                call_fallback()
            }
        }
    }
}

//! Data models for news articles and their summaries.
//!
//! - [`Article`]: a story as returned by the news search provider
//! - [`Summary`]: the three-part analysis attached to one article
//! - [`Entry`]: an article paired with its summary, ready for formatting
//!
//! Nothing here outlives a single pipeline run.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A news article as returned by the search provider.
///
/// Field names follow the provider's JSON (`publishedAt`). Extra fields in the
/// payload, such as `source` or `urlToImage`, are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// The article headline, usually suffixed with ` - Publisher`.
    pub title: String,
    /// Short description or lede. Frequently missing.
    #[serde(default)]
    pub description: Option<String>,
    /// Link to the full story.
    pub url: String,
    /// Publication timestamp.
    pub published_at: DateTime<Utc>,
}

impl Article {
    /// Text handed to the summarizer: the title, then the description if any.
    pub fn analysis_text(&self) -> String {
        format!(
            "{}\n{}",
            self.title,
            self.description.as_deref().unwrap_or_default()
        )
    }
}

/// Envelope of the news search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub articles: Vec<Article>,
}

/// Three-sentence analysis of a single article.
///
/// All fields are non-empty. When the model cannot supply them, the
/// summarizer substitutes a fixed fallback instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// The key takeaway of the story.
    pub takeaway: String,
    /// Impact on the industry or society.
    pub impact: String,
    /// Why the story matters to professionals.
    pub why_matters: String,
}

/// An article together with its summary.
#[derive(Debug, Clone)]
pub struct Entry {
    pub article: Article,
    pub summary: Summary,
}

//! Rendering of the daily digest post.
//!
//! The layout is fixed:
//!
//! ```text
//! 🤖 AI Innovation Digest - May 06, 2025
//!
//! Today's curated insights on ...
//!
//! 📰 1. {title}
//!
//! 🔍 Key Takeaway: ...
//! 💡 Impact: ...
//! 💼 Why It Matters: ...
//! 🔗 Read more: {url}
//!
//! (one block per article)
//! -------------------
//! {promotional footer}
//!
//! {hashtags}
//! ```

use crate::models::Entry;
use chrono::NaiveDate;
use itertools::Itertools;
use std::fmt::{self, Write};
use tracing::{error, info, instrument};

pub const TAKEAWAY_LABEL: &str = "Key Takeaway:";
pub const IMPACT_LABEL: &str = "Impact:";
pub const WHY_MATTERS_LABEL: &str = "Why It Matters:";

const INTRO: &str =
    "Today's curated insights on the latest AI developments, analyzed by our AI for busy professionals.";
const FOOTER: &str = "-------------------\n\
🚀 Want AI-powered insights for your LinkedIn presence?\n\
Check out our AI News Poster service: https://hazzler78.github.io/linkedin-ai-news/\n\
Stay ahead of the curve with automated, intelligent content curation.";
const HASHTAGS: &str =
    "#ArtificialIntelligence #AIInnovation #TechNews #FutureOfWork #LinkedInAutomation";

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().join(" ")
}

/// Strip the publisher suffix from a headline and tidy its whitespace.
///
/// `"AI firm unveils  model - TechSite"` becomes `"AI firm unveils model"`.
/// Everything from the first `" - "` on is dropped, which keeps the function
/// idempotent.
pub fn clean_title(title: &str) -> String {
    let collapsed = collapse_whitespace(title);
    match collapsed.split_once(" - ") {
        Some((head, _)) => head.trim().to_string(),
        None => collapsed,
    }
}

/// Render the post for `entries` dated `date`.
///
/// Returns `None` when there is nothing to post, or if assembly fails.
#[instrument(level = "info", skip_all, fields(entries = entries.len(), %date))]
pub fn format_post(entries: &[Entry], date: NaiveDate) -> Option<String> {
    if entries.is_empty() {
        info!("No entries to format");
        return None;
    }
    let mut post = String::new();
    match render(&mut post, entries, date) {
        Ok(()) => Some(post),
        Err(e) => {
            error!(error = %e, "Failed to format post");
            None
        }
    }
}

fn render(out: &mut String, entries: &[Entry], date: NaiveDate) -> fmt::Result {
    writeln!(out, "🤖 AI Innovation Digest - {}\n", date.format("%B %d, %Y"))?;
    writeln!(out, "{}\n", INTRO)?;

    for (i, entry) in entries.iter().enumerate() {
        writeln!(out, "📰 {}. {}\n", i + 1, clean_title(&entry.article.title))?;
        writeln!(out, "🔍 {} {}", TAKEAWAY_LABEL, collapse_whitespace(&entry.summary.takeaway))?;
        writeln!(out, "💡 {} {}", IMPACT_LABEL, collapse_whitespace(&entry.summary.impact))?;
        writeln!(
            out,
            "💼 {} {}",
            WHY_MATTERS_LABEL,
            collapse_whitespace(&entry.summary.why_matters)
        )?;
        writeln!(out, "🔗 Read more: {}\n", entry.article.url.trim())?;
    }

    writeln!(out, "{}\n", FOOTER)?;
    write!(out, "{}", HASHTAGS)
}

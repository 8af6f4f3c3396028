//! Relevance filtering of candidate articles.
//!
//! The news query is broad enough to pull in market coverage ("AI stocks
//! rally", "Nvidia shares ..."). Those stories are dropped by title keyword
//! before anything is sent to the model.

use crate::formatter::clean_title;
use crate::models::Article;
use itertools::Itertools;
use regex::{Regex, RegexBuilder};
use tracing::{debug, info, instrument};

/// Drops articles whose title mentions an excluded keyword and keeps the top N.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    /// `None` when the exclusion list is empty.
    matcher: Option<Regex>,
    limit: usize,
}

impl RelevanceFilter {
    pub fn new<S: AsRef<str>>(exclusions: &[S], limit: usize) -> Result<Self, regex::Error> {
        let keywords = exclusions
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect::<Vec<_>>();

        let matcher = if keywords.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&keywords.join("|"))
                    .case_insensitive(true)
                    .build()?,
            )
        };
        Ok(Self { matcher, limit })
    }

    /// Whether the title contains any excluded keyword, ignoring case.
    pub fn is_excluded(&self, title: &str) -> bool {
        self.matcher.as_ref().is_some_and(|m| m.is_match(title))
    }

    /// Remove excluded articles, then keep at most `limit` of the rest.
    ///
    /// Order is preserved. Truncation happens after filtering, so dropped
    /// articles are replaced only from within the fetched window.
    #[instrument(level = "info", skip_all, fields(input = articles.len()))]
    pub fn filter(&self, articles: Vec<Article>) -> Vec<Article> {
        let kept = articles
            .into_iter()
            .filter(|a| {
                let excluded = self.is_excluded(&a.title);
                if excluded {
                    debug!(title = %a.title, "Excluded off-topic article");
                }
                !excluded
            })
            .take(self.limit)
            .collect::<Vec<_>>();
        info!(kept = kept.len(), limit = self.limit, "Filtered articles");
        kept
    }
}

/// Drop articles whose cleaned title repeats an earlier one.
///
/// Syndicated stories often show up several times under different outlets;
/// the first (newest) copy wins.
pub fn dedupe_titles(articles: Vec<Article>) -> Vec<Article> {
    articles
        .into_iter()
        .unique_by(|a| clean_title(&a.title).to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NewsSettings;
    use chrono::Utc;

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            description: None,
            url: format!("https://example.com/{}", title.len()),
            published_at: Utc::now(),
        }
    }

    fn default_filter(limit: usize) -> RelevanceFilter {
        RelevanceFilter::new(&NewsSettings::default().exclusions, limit).unwrap()
    }

    fn titles(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.title.as_str()).collect()
    }

    #[test]
    fn test_excludes_each_keyword_case_insensitively() {
        let filter = default_filter(10);
        for title in [
            "AI Stocks surge",
            "NASDAQ closes higher on AI hype",
            "Listed on the NYSE today",
            "Chipmaker SHARES climb",
            "The AI market is booming",
            "Supermarkets adopt AI checkout",
        ] {
            assert!(filter.is_excluded(title), "{title} should be excluded");
        }
        assert!(!filter.is_excluded("OpenAI releases a new research model"));
    }

    #[test]
    fn test_filter_preserves_order_and_never_grows() {
        let filter = default_filter(10);
        let input = vec![
            article("First AI lab result"),
            article("AI stock tumbles"),
            article("Second machine learning paper"),
            article("Market watch: AI"),
            article("Third: Gemini update"),
        ];
        let output = filter.filter(input.clone());
        assert!(output.len() <= input.len());
        assert_eq!(
            titles(&output),
            vec!["First AI lab result", "Second machine learning paper", "Third: Gemini update"]
        );
    }

    #[test]
    fn test_truncates_after_filtering() {
        let filter = default_filter(3);
        let input = vec![
            article("Nasdaq AI rally"),
            article("A"),
            article("B shares"),
            article("C"),
            article("D"),
            article("E"),
        ];
        assert_eq!(titles(&filter.filter(input)), vec!["A", "C", "D"]);
    }

    #[test]
    fn test_no_backfill_beyond_fetch_window() {
        let filter = default_filter(3);
        let input = vec![article("stock one"), article("Only survivor"), article("market two")];
        assert_eq!(titles(&filter.filter(input)), vec!["Only survivor"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(default_filter(3).filter(Vec::new()).is_empty());
    }

    #[test]
    fn test_empty_exclusion_list_keeps_everything() {
        let filter = RelevanceFilter::new::<&str>(&[], 10).unwrap();
        assert!(!filter.is_excluded("AI stocks"));
        assert_eq!(filter.filter(vec![article("AI stocks")]).len(), 1);
    }

    #[test]
    fn test_keywords_are_literal() {
        let filter = RelevanceFilter::new(&["a.b"], 10).unwrap();
        assert!(filter.is_excluded("see A.B here"));
        assert!(!filter.is_excluded("see axb here"));
    }

    #[test]
    fn test_dedupe_titles_keeps_first_copy() {
        let input = vec![
            article("AI firm unveils model - TechSite"),
            article("Other story"),
            article("AI  firm unveils model - Wire Service"),
        ];
        let output = dedupe_titles(input);
        assert_eq!(
            titles(&output),
            vec!["AI firm unveils model - TechSite", "Other story"]
        );
    }
}

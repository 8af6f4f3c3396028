//! One end-to-end run: fetch, filter, analyze, format, publish.
//!
//! Every step absorbs its own failures and hands the next step a usable
//! value, so a run always finishes with a [`RunReport`] rather than an error:
//!
//! 1. **Fetch**: provider error → no articles
//! 2. **Filter**: drop duplicates and off-topic titles, keep the top N
//! 3. **Analyze**: one model call per article, fallback summary on failure
//! 4. **Format**: no entries or formatting failure → skip the run
//! 5. **Publish**: failure is reported, never retried

use crate::chat::ChatCompletion;
use crate::error::ApiError;
use crate::filter::{RelevanceFilter, dedupe_titles};
use crate::formatter::format_post;
use crate::linkedin::Publisher;
use crate::models::Entry;
use crate::news::ArticleSource;
use crate::summarizer::Summarizer;
use chrono::Utc;
use std::fmt;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Whether a run ends by publishing or by printing the post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Publish,
    Preview,
}

/// Stand-in publisher for preview runs, which never publish.
#[derive(Debug, Clone, Copy)]
pub struct NoPublisher;

impl Publisher for NoPublisher {
    async fn publish(&self, _text: &str) -> Result<(), ApiError> {
        Err(ApiError::Malformed("publishing is disabled in preview mode".to_string()))
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// The source returned nothing usable; nothing was published.
    NoArticles,
    /// Articles were analyzed but no post could be built.
    FormatFailed,
    /// Preview mode: the post was built and not published.
    Previewed { articles: usize, post: String },
    Published { articles: usize },
    PublishFailed { articles: usize, reason: String },
}

impl RunReport {
    /// `false` only when a post was built and the network rejected it.
    pub fn is_success(&self) -> bool {
        !matches!(self, RunReport::PublishFailed { .. } | RunReport::FormatFailed)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunReport::NoArticles => write!(f, "no articles"),
            RunReport::FormatFailed => write!(f, "formatting failed"),
            RunReport::Previewed { articles, .. } => write!(f, "previewed {} articles", articles),
            RunReport::Published { articles } => write!(f, "published {} articles", articles),
            RunReport::PublishFailed { articles, reason } => {
                write!(f, "publishing {} articles failed: {}", articles, reason)
            }
        }
    }
}

/// The query parameters for the article source.
#[derive(Debug, Clone)]
pub struct Query {
    pub text: String,
    pub page_size: u32,
}

/// Wires the components of a run together.
#[derive(Debug)]
pub struct Pipeline<S, M, P> {
    source: S,
    query: Query,
    filter: RelevanceFilter,
    summarizer: Summarizer<M>,
    publisher: P,
    mode: Mode,
}

impl<S, M, P> Pipeline<S, M, P>
where
    S: ArticleSource,
    M: ChatCompletion,
    P: Publisher,
{
    pub fn new(
        source: S,
        query: Query,
        filter: RelevanceFilter,
        summarizer: Summarizer<M>,
        publisher: P,
        mode: Mode,
    ) -> Self {
        Self {
            source,
            query,
            filter,
            summarizer,
            publisher,
            mode,
        }
    }

    /// Execute one run to completion.
    #[instrument(level = "info", skip_all, fields(mode = ?self.mode))]
    pub async fn run(&self) -> RunReport {
        let t0 = Instant::now();
        info!(started_at = %Utc::now().format("%Y-%m-%d %H:%M:%S"), "Starting AI news run");

        let fetched = match self.source.fetch(&self.query.text, self.query.page_size).await {
            Ok(articles) => articles,
            Err(e) => {
                error!(error = %e, "Error fetching news; treating as empty");
                Vec::new()
            }
        };
        let articles = self.filter.filter(dedupe_titles(fetched));

        if articles.is_empty() {
            info!("No articles found");
            return RunReport::NoArticles;
        }

        let mut entries = Vec::with_capacity(articles.len());
        for article in articles {
            let summary = self.summarizer.analyze(&article).await;
            entries.push(Entry { article, summary });
        }
        let count = entries.len();
        info!(count, "Found and analyzed articles");

        let Some(post) = format_post(&entries, Utc::now().date_naive()) else {
            warn!("Failed to format post content");
            return RunReport::FormatFailed;
        };
        info!(post = %post, "Post content preview");

        let report = match self.mode {
            Mode::Preview => RunReport::Previewed {
                articles: count,
                post,
            },
            Mode::Publish => match self.publisher.publish(&post).await {
                Ok(()) => RunReport::Published { articles: count },
                Err(e) => {
                    error!(error = %e, status = ?e.status(), "Error posting to LinkedIn");
                    RunReport::PublishFailed {
                        articles: count,
                        reason: e.to_string(),
                    }
                }
            },
        };

        info!(elapsed_ms = t0.elapsed().as_millis(), outcome = %report, "Run complete");
        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{ChatSettings, NewsSettings};
    use crate::models::Article;
    use crate::summarizer::call_fallback;
    use crate::summarizer::tests::ScriptedModel;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    pub(crate) struct FixedSource(pub(crate) Result<Vec<Article>, u16>);

    impl ArticleSource for FixedSource {
        async fn fetch(&self, _query: &str, _page_size: u32) -> Result<Vec<Article>, ApiError> {
            self.0.clone().map_err(|code| ApiError::Status {
                status: StatusCode::from_u16(code).unwrap(),
                body: String::new(),
            })
        }
    }

    /// Records posts; answers with `status` (`None` means success).
    pub(crate) struct RecordingPublisher {
        pub(crate) status: Option<u16>,
        pub(crate) posts: Mutex<Vec<String>>,
    }

    impl RecordingPublisher {
        pub(crate) fn new(status: Option<u16>) -> Self {
            Self {
                status,
                posts: Mutex::new(Vec::new()),
            }
        }
    }

    impl Publisher for RecordingPublisher {
        async fn publish(&self, text: &str) -> Result<(), ApiError> {
            self.posts.lock().unwrap().push(text.to_string());
            match self.status {
                None => Ok(()),
                Some(code) => Err(ApiError::Status {
                    status: StatusCode::from_u16(code).unwrap(),
                    body: "{\"message\":\"denied\"}".to_string(),
                }),
            }
        }
    }

    pub(crate) fn article(title: &str, url: &str) -> Article {
        Article {
            title: title.to_string(),
            description: Some("...".to_string()),
            url: url.to_string(),
            published_at: Utc::now(),
        }
    }

    pub(crate) fn pipeline(
        source: Result<Vec<Article>, u16>,
        answers: Vec<Result<&str, u16>>,
        publish_status: Option<u16>,
        mode: Mode,
    ) -> Pipeline<FixedSource, ScriptedModel, RecordingPublisher> {
        let news = NewsSettings::default();
        Pipeline::new(
            FixedSource(source),
            Query {
                text: news.query.clone(),
                page_size: news.page_size,
            },
            RelevanceFilter::new(&news.exclusions, news.top_n).unwrap(),
            Summarizer::new(ScriptedModel::new(answers), ChatSettings::default()),
            RecordingPublisher::new(publish_status),
            mode,
        )
    }

    #[tokio::test]
    async fn test_single_article_end_to_end() {
        let p = pipeline(
            Ok(vec![article("AI firm unveils model - TechSite", "https://t.example/1")]),
            vec![Ok("A|B|C")],
            None,
            Mode::Publish,
        );
        assert_eq!(p.run().await, RunReport::Published { articles: 1 });

        let posts = p.publisher.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        let title = post.find("AI firm unveils model\n").unwrap();
        let a = post.find("Key Takeaway: A").unwrap();
        let b = post.find("Impact: B").unwrap();
        let c = post.find("Why It Matters: C").unwrap();
        assert!(title < a && a < b && b < c);
    }

    #[tokio::test]
    async fn test_empty_source_skips_publish() {
        let p = pipeline(Ok(vec![]), vec![], None, Mode::Publish);
        assert_eq!(p.run().await, RunReport::NoArticles);
        assert!(p.publisher.posts.lock().unwrap().is_empty());
        assert!(p.summarizer_requests() == 0);
    }

    #[tokio::test]
    async fn test_source_error_is_treated_as_empty() {
        let p = pipeline(Err(500), vec![], None, Mode::Publish);
        assert_eq!(p.run().await, RunReport::NoArticles);
        assert!(p.publisher.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_articles_filtered_out() {
        let p = pipeline(
            Ok(vec![article("AI stocks soar", "https://x/1"), article("Nasdaq record", "https://x/2")]),
            vec![],
            None,
            Mode::Publish,
        );
        assert_eq!(p.run().await, RunReport::NoArticles);
    }

    #[tokio::test]
    async fn test_model_failure_still_publishes() {
        let p = pipeline(
            Ok(vec![article("Lab ships agent - Wire", "https://x/1")]),
            vec![Err(500)],
            None,
            Mode::Publish,
        );
        assert_eq!(p.run().await, RunReport::Published { articles: 1 });
        let posts = p.publisher.posts.lock().unwrap();
        assert!(posts[0].contains(&call_fallback().takeaway));
    }

    #[tokio::test]
    async fn test_publish_rejection_is_reported() {
        let p = pipeline(
            Ok(vec![article("Lab ships agent", "https://x/1")]),
            vec![Ok("A|B|C")],
            Some(401),
            Mode::Publish,
        );
        let report = p.run().await;
        assert!(matches!(report, RunReport::PublishFailed { articles: 1, .. }));
        assert!(!report.is_success());
        assert!(report.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_only_top_three_are_analyzed() {
        let p = pipeline(
            Ok(vec![
                article("One", "https://x/1"),
                article("Two shares jump", "https://x/2"),
                article("Three", "https://x/3"),
                article("Four", "https://x/4"),
                article("Five", "https://x/5"),
            ]),
            vec![Ok("a|b|c"), Ok("d|e|f"), Ok("g|h|i")],
            None,
            Mode::Publish,
        );
        assert_eq!(p.run().await, RunReport::Published { articles: 3 });
        assert_eq!(p.summarizer_requests(), 3);
        let posts = p.publisher.posts.lock().unwrap();
        assert!(posts[0].contains("📰 3. Four"));
        assert!(!posts[0].contains("Five"));
    }

    #[tokio::test]
    async fn test_preview_does_not_publish() {
        let p = pipeline(
            Ok(vec![article("Preview me", "https://x/1")]),
            vec![Ok("A|B|C")],
            None,
            Mode::Preview,
        );
        match p.run().await {
            RunReport::Previewed { articles, post } => {
                assert_eq!(articles, 1);
                assert!(post.contains("📰 1. Preview me"));
            }
            other => panic!("unexpected report: {other}"),
        }
        assert!(p.publisher.posts.lock().unwrap().is_empty());
    }

    impl Pipeline<FixedSource, ScriptedModel, RecordingPublisher> {
        fn summarizer_requests(&self) -> usize {
            self.summarizer.model().requests.lock().unwrap().len()
        }
    }
}

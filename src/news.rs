//! News search client.
//!
//! Queries the NewsAPI `everything` endpoint for the latest AI stories,
//! newest first. See [`NewsApiClient::fetch`] for the request shape.

use crate::config::{NewsSettings, Secret};
use crate::error::ApiError;
use crate::models::{Article, SearchResponse};
use crate::transport::{Transport, ensure_success};
use tracing::{debug, info, instrument};

/// Something that can produce candidate articles for a run.
pub trait ArticleSource {
    /// Return up to `page_size` articles matching `query`, newest first.
    async fn fetch(&self, query: &str, page_size: u32) -> Result<Vec<Article>, ApiError>;
}

/// [`ArticleSource`] backed by the NewsAPI search endpoint.
#[derive(Debug)]
pub struct NewsApiClient {
    transport: Transport,
    endpoint: String,
    language: String,
    api_key: Secret,
}

impl NewsApiClient {
    pub fn new(transport: Transport, settings: &NewsSettings, api_key: Secret) -> Self {
        Self {
            transport,
            endpoint: settings.endpoint.clone(),
            language: settings.language.clone(),
            api_key,
        }
    }
}

impl ArticleSource for NewsApiClient {
    /// `GET {endpoint}?q=..&language=en&sortBy=publishedAt&pageSize=..&apiKey=..`
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, query: &str, page_size: u32) -> Result<Vec<Article>, ApiError> {
        let page_size = page_size.to_string();
        let response = self
            .transport
            .send_with_retry(|http| {
                http.get(&self.endpoint).query(&[
                    ("q", query),
                    ("language", self.language.as_str()),
                    ("sortBy", "publishedAt"),
                    ("pageSize", page_size.as_str()),
                    ("apiKey", self.api_key.expose()),
                ])
            })
            .await?;

        let body = ensure_success(response).await?.text().await?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Malformed(e.to_string()))?;

        info!(count = parsed.articles.len(), "Fetched news articles");
        debug!(titles = ?parsed.articles.iter().map(|a| &a.title).collect::<Vec<_>>(), "News titles");
        Ok(parsed.articles)
    }
}

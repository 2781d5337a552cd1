//! Core data models for newsfetch
//!
//! This module contains the query description, the normalized article and
//! result types, the wire payload shape shared by the API and the cache, and
//! the HTTP client for the news API.

pub mod news_api;
pub mod payload;
pub mod query;

pub use news_api::{NewsApiClient, NewsSource};
pub use payload::{ResponsePayload, WireArticle, WireSource};
pub use query::{normalize_sources, Endpoint, QuerySpec, SearchParams, MAX_PAGE_SIZE};

use chrono::{DateTime, Utc};

/// A single news article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Display name of the publishing source
    pub source: String,
    /// Source identifier, when the remote provides one
    pub source_id: Option<String>,
    pub author: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    /// Lead image, if any
    pub url_to_image: Option<String>,
    /// Publication time; absent when missing or not RFC 3339
    pub published_at: Option<DateTime<Utc>>,
    /// Truncated article body, if any
    pub content: Option<String>,
}

/// Outcome of one search
///
/// Lives only for one fetch-and-format cycle; the cache stores its payload
/// form, never the struct itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    /// Remote status string, `"ok"` for successful responses
    pub status: String,
    /// Total matches reported by the remote (may exceed `articles.len()`)
    pub total_results: u64,
    /// Articles in the order the remote returned them
    pub articles: Vec<Article>,
    /// The query that produced this result
    pub query: QuerySpec,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

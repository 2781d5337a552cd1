//! Wire format of a search response
//!
//! Both the HTTP body and the cached payload use this shape, so a cache hit
//! goes through the same strict parsing as a fresh response.
//! `title`, `url` and `source.name` are required; everything else is optional.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Article, QuerySpec, ResultSet};
use crate::error::NewsError;

/// Status value the remote uses for successful responses
pub const STATUS_OK: &str = "ok";

/// Top-level search response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    pub status: String,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub articles: Vec<WireArticle>,
}

/// One article as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireArticle {
    pub source: WireSource,
    #[serde(default)]
    pub author: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSource {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// Error envelope the remote returns with `status: "error"`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl From<WireArticle> for Article {
    fn from(wire: WireArticle) -> Self {
        Article {
            source: wire.source.name,
            source_id: non_empty(wire.source.id),
            author: non_empty(wire.author),
            title: wire.title,
            description: non_empty(wire.description),
            url: wire.url,
            url_to_image: non_empty(wire.url_to_image),
            published_at: wire.published_at.as_deref().and_then(parse_timestamp),
            content: non_empty(wire.content),
        }
    }
}

impl From<&Article> for WireArticle {
    fn from(article: &Article) -> Self {
        WireArticle {
            source: WireSource {
                id: article.source_id.clone(),
                name: article.source.clone(),
            },
            author: article.author.clone(),
            title: article.title.clone(),
            description: article.description.clone(),
            url: article.url.clone(),
            url_to_image: article.url_to_image.clone(),
            published_at: article
                .published_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            content: article.content.clone(),
        }
    }
}

impl ResultSet {
    /// Parses a JSON payload into a result set for `query`.
    ///
    /// A payload whose `status` is not `"ok"` is reported as an API error
    /// carrying the payload's `code` and `message`.
    pub fn from_payload(payload: Value, query: &QuerySpec) -> Result<Self, NewsError> {
        let status = payload.get("status").and_then(Value::as_str);
        if status != Some(STATUS_OK) {
            let body: ErrorBody = serde_json::from_value(payload.clone()).unwrap_or(ErrorBody {
                status: None,
                code: None,
                message: None,
            });
            if body.status.is_none() {
                return Err(NewsError::Parse("response has no status field".to_string()));
            }
            return Err(NewsError::Api {
                status: 200,
                code: body.code.unwrap_or_else(|| "unknown".to_string()),
                message: body.message.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        let wire: ResponsePayload = serde_json::from_value(payload)?;
        Ok(ResultSet {
            status: wire.status,
            total_results: wire.total_results,
            articles: wire.articles.into_iter().map(Article::from).collect(),
            query: query.clone(),
        })
    }

    /// Wire form of this result set
    pub fn to_payload(&self) -> ResponsePayload {
        ResponsePayload {
            status: self.status.clone(),
            total_results: self.total_results,
            articles: self.articles.iter().map(WireArticle::from).collect(),
        }
    }

    /// Wire form as a JSON value, as stored in the cache
    pub fn to_payload_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self.to_payload())
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

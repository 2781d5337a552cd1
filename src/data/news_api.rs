//! NewsAPI HTTP client
//!
//! Builds requests from a `QuerySpec`, issues them, and classifies the
//! response into a `ResultSet` or a typed `NewsError`. The client never
//! retries; that policy lives in the fetcher.

use std::future::Future;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::payload::ErrorBody;
use super::{Endpoint, QuerySpec, ResultSet};
use crate::config::NewsConfig;
use crate::error::NewsError;

/// Header carrying the credential
const API_KEY_HEADER: &str = "X-Api-Key";

/// Something that can answer a search query
///
/// Implemented by [`NewsApiClient`]; tests substitute their own sources.
pub trait NewsSource {
    /// Runs one search against the backing service
    fn execute(&self, query: &QuerySpec)
        -> impl Future<Output = Result<ResultSet, NewsError>> + Send;
}

/// Client for the NewsAPI v2 search endpoints
#[derive(Debug, Clone)]
pub struct NewsApiClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    /// Creates a client using the base URL and timeout from `config`
    pub fn new(api_key: impl Into<String>, config: &NewsConfig) -> Result<Self, NewsError> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("newsfetch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(http_client, config.base_url.clone(), api_key))
    }

    /// Creates a client with a custom HTTP client and base URL
    pub fn with_client(
        http_client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Full URL of an endpoint, without query parameters
    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    /// Builds the GET request for `query` without sending it
    pub fn build_request(&self, query: &QuerySpec) -> Result<reqwest::Request, NewsError> {
        let request = self
            .http_client
            .get(self.endpoint_url(query.endpoint()))
            .query(query.params())
            .header(API_KEY_HEADER, &self.api_key)
            .build()?;
        Ok(request)
    }

    async fn send(&self, query: &QuerySpec) -> Result<ResultSet, NewsError> {
        let request = self.build_request(query)?;
        debug!(endpoint = %query.endpoint(), params = ?query.params(), "sending request");

        let response = self.http_client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "received response");

        classify_response(status, &body, query)
    }
}

impl NewsSource for NewsApiClient {
    fn execute(
        &self,
        query: &QuerySpec,
    ) -> impl Future<Output = Result<ResultSet, NewsError>> + Send {
        self.send(query)
    }
}

/// Maps an HTTP status and body onto a result set or an error.
///
/// - 2xx: strict payload parse (a body with a non-`ok` status is an API error)
/// - 4xx: `Api` with the remote's code and message
/// - anything else: `Transport`
pub fn classify_response(
    status: StatusCode,
    body: &str,
    query: &QuerySpec,
) -> Result<ResultSet, NewsError> {
    if status.is_success() {
        let payload: Value = serde_json::from_str(body)?;
        return ResultSet::from_payload(payload, query).map_err(|err| match err {
            NewsError::Api { code, message, .. } => NewsError::Api {
                status: status.as_u16(),
                code,
                message,
            },
            other => other,
        });
    }

    let error_body = serde_json::from_str::<ErrorBody>(body).ok();
    let (code, message) = match error_body {
        Some(body) => (body.code, body.message),
        None => (None, None),
    };
    let reason = status.canonical_reason().unwrap_or("Unknown status");

    if status.is_client_error() {
        Err(NewsError::Api {
            status: status.as_u16(),
            code: code.unwrap_or_else(|| status.as_u16().to_string()),
            message: message.unwrap_or_else(|| reason.to_string()),
        })
    } else {
        Err(NewsError::Transport(format!(
            "server returned {} {}{}",
            status.as_u16(),
            reason,
            message.map(|m| format!(": {}", m)).unwrap_or_default()
        )))
    }
}

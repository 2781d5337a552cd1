//! newsfetch library
//!
//! Turns search parameters into a throttled, cached call against the NewsAPI
//! search endpoints and renders the resulting articles. The binary in
//! `main.rs` is a thin shell over these modules; integration tests use them
//! directly.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod fetcher;
pub mod output;
pub mod rate;

pub use cache::{CacheKey, CacheStore, ResponseCache};
pub use config::{NewsConfig, OutputConfig, RetryPolicy};
pub use data::{Article, Endpoint, NewsApiClient, NewsSource, QuerySpec, ResultSet};
pub use error::NewsError;
pub use fetcher::{FetchOptions, Fetcher};
pub use output::{OutputFormat, ResultFormatter};
pub use rate::RateGovernor;

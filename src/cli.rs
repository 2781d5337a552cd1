//! Command-line interface for newsfetch
//!
//! Parses arguments with clap, validates the values the remote would reject,
//! and turns them into the `SearchParams`, `NewsConfig` and `FetchOptions`
//! the fetcher needs.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::cache::CacheError;
use crate::config::{NewsConfig, RetryPolicy, DEFAULT_BASE_URL, MAX_CACHE_TTL_SECS};
use crate::data::{Endpoint, SearchParams, MAX_PAGE_SIZE};
use crate::error::NewsError;
use crate::fetcher::FetchOptions;
use crate::output::OutputFormat;

/// Fallback environment variable for the credential
pub const FALLBACK_API_KEY_ENV: &str = "NEWS_API_KEY";

/// Exit code for bad arguments, missing credentials and cache maintenance failures
pub const EXIT_INVALID: u8 = 1;
/// Exit code when the remote rejects the request
pub const EXIT_API: u8 = 3;
/// Exit code for network, timeout and malformed-response failures
pub const EXIT_TRANSPORT: u8 = 4;

/// Country codes accepted by the remote
pub const VALID_COUNTRY_CODES: &[&str] = &[
    "ae", "ar", "at", "au", "be", "bg", "br", "ca", "ch", "cn", "co", "cu", "cz", "de", "eg",
    "fr", "gb", "gr", "hk", "hu", "id", "ie", "il", "in", "it", "jp", "kr", "lt", "lv", "ma",
    "mx", "my", "ng", "nl", "no", "nz", "ph", "pl", "pt", "ro", "rs", "ru", "sa", "se", "sg",
    "si", "sk", "th", "tr", "tw", "ua", "us", "ve", "za",
];

/// Language codes accepted by the remote
pub const VALID_LANGUAGE_CODES: &[&str] = &[
    "ar", "de", "en", "es", "fr", "he", "it", "nl", "no", "pt", "ru", "sv", "ud", "zh",
];

/// Errors surfaced to the user by the binary
#[derive(Debug, Error)]
pub enum CliError {
    /// One or more arguments failed validation
    #[error("{}", .0.join("\nError: "))]
    InvalidArguments(Vec<String>),

    /// No credential in flags or environment
    #[error("NewsAPI key not found. Please set NEWSAPI_KEY or NEWS_API_KEY environment variable.")]
    MissingApiKey,

    /// Cache maintenance failed
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The fetch itself failed
    #[error(transparent)]
    Fetch(#[from] NewsError),

    /// Writing the rendered output failed
    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Fetch(NewsError::Api { .. }) => EXIT_API,
            CliError::Fetch(_) => EXIT_TRANSPORT,
            _ => EXIT_INVALID,
        }
    }
}

/// News categories for top headlines
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Category {
    Business,
    Entertainment,
    General,
    Health,
    Science,
    Sports,
    Technology,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Entertainment => "entertainment",
            Category::General => "general",
            Category::Health => "health",
            Category::Science => "science",
            Category::Sports => "sports",
            Category::Technology => "technology",
        }
    }
}

/// Sort orders for the everything endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    Relevancy,
    Popularity,
    #[value(name = "publishedAt")]
    PublishedAt,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Relevancy => "relevancy",
            SortBy::Popularity => "popularity",
            SortBy::PublishedAt => "publishedAt",
        }
    }
}

/// Fetch and filter news articles from NewsAPI
#[derive(Parser, Debug)]
#[command(name = "newsfetch")]
#[command(about = "Fetch and filter news articles from NewsAPI")]
#[command(version)]
#[command(after_help = "Examples:
  newsfetch --query \"artificial intelligence\" --country us
  newsfetch --category technology --language en --country gb
  newsfetch --sources \"bbc-news,cnn\" --output json
  newsfetch --everything --query \"climate change\" --sort-by popularity")]
pub struct Cli {
    /// Fetch top headlines (default)
    #[arg(long, conflicts_with = "everything")]
    pub headlines: bool,

    /// Search through the full article archive
    #[arg(long)]
    pub everything: bool,

    /// Keywords or phrases to search for
    #[arg(short, long)]
    pub query: Option<String>,

    /// Category of news to fetch
    #[arg(short, long, value_enum)]
    pub category: Option<Category>,

    /// Country code (e.g. us, gb, de, fr)
    #[arg(long)]
    pub country: Option<String>,

    /// Language code
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Comma-separated list of news sources (e.g. bbc-news,cnn)
    #[arg(long)]
    pub sources: Option<String>,

    /// Oldest article date (YYYY-MM-DD)
    #[arg(long)]
    pub from_date: Option<String>,

    /// Newest article date (YYYY-MM-DD)
    #[arg(long)]
    pub to_date: Option<String>,

    /// Fetch articles from the last N days (overrides --from-date)
    #[arg(long, value_name = "N")]
    pub last_days: Option<u32>,

    /// Sort order for --everything
    #[arg(long, value_enum, default_value_t = SortBy::PublishedAt)]
    pub sort_by: SortBy,

    /// Number of articles to fetch (1-100)
    #[arg(long, default_value_t = 20)]
    pub page_size: u32,

    /// Page number to fetch
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Console)]
    pub output: OutputFormat,

    /// Disable caching of API responses
    #[arg(long)]
    pub no_cache: bool,

    /// Enable verbose output and debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// NewsAPI key (falls back to NEWS_API_KEY)
    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Directory for cached responses
    #[arg(long, env = "NEWSFETCH_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Seconds a cached response stays fresh (at most one year)
    #[arg(
        long,
        default_value_t = 300,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(..=MAX_CACHE_TTL_SECS)
    )]
    pub cache_ttl: u64,

    /// Minimum milliseconds between API requests
    #[arg(long, default_value_t = 1000, value_name = "MS")]
    pub min_interval_ms: u64,

    /// Retry network failures up to N times with exponential backoff
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub retries: u32,

    /// API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL, hide = true)]
    pub base_url: String,

    /// Remove all cached responses and exit
    #[arg(long, conflicts_with = "prune_cache")]
    pub clear_cache: bool,

    /// Remove expired cached responses and exit
    #[arg(long)]
    pub prune_cache: bool,
}

impl Cli {
    pub fn endpoint(&self) -> Endpoint {
        if self.everything {
            Endpoint::Everything
        } else {
            Endpoint::TopHeadlines
        }
    }

    /// Validates the search arguments and converts them to `SearchParams`.
    ///
    /// `today` anchors `--last-days`. All problems are reported together.
    pub fn search_params(&self, today: NaiveDate) -> Result<SearchParams, CliError> {
        let mut errors = Vec::new();

        if let Some(country) = &self.country {
            if !is_valid_country_code(country) {
                errors.push(format!("Invalid country code: {}", country));
            }
        }
        if !is_valid_language_code(&self.language) {
            errors.push(format!("Invalid language code: {}", self.language));
        }

        let from = parse_date_arg("from-date", self.from_date.as_deref(), &mut errors);
        let to = parse_date_arg("to-date", self.to_date.as_deref(), &mut errors);
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                errors.push("From date must be before to date".to_string());
            }
        }

        if self.page_size < 1 || self.page_size > MAX_PAGE_SIZE {
            errors.push(format!("Page size must be between 1 and {}", MAX_PAGE_SIZE));
        }
        if self.page < 1 {
            errors.push("Page number must be greater than 0".to_string());
        }

        let mut from_date = self.from_date.clone();
        if let Some(days) = self.last_days {
            if days < 1 {
                errors.push("Last days must be greater than 0".to_string());
            } else {
                match today.checked_sub_days(Days::new(u64::from(days))) {
                    Some(date) => from_date = Some(date.format("%Y-%m-%d").to_string()),
                    None => errors.push(format!("Last days out of range: {}", days)),
                }
            }
        }

        if !errors.is_empty() {
            return Err(CliError::InvalidArguments(errors));
        }

        Ok(SearchParams {
            query: self.query.clone(),
            category: self.category.map(|c| c.as_str().to_string()),
            country: self.country.as_ref().map(|c| c.to_lowercase()),
            language: Some(self.language.to_lowercase()),
            sources: self.sources.clone(),
            from_date,
            to_date: self.to_date.clone(),
            sort_by: Some(self.sort_by.as_str().to_string()),
            page_size: Some(self.page_size),
            page: Some(self.page),
        })
    }

    /// Credential from `--api-key`/`NEWSAPI_KEY`, else `NEWS_API_KEY`
    pub fn resolve_api_key(&self) -> Result<String, CliError> {
        self.resolve_api_key_with(std::env::var(FALLBACK_API_KEY_ENV).ok())
    }

    /// Like [`Cli::resolve_api_key`] with an explicit fallback value
    pub fn resolve_api_key_with(&self, fallback: Option<String>) -> Result<String, CliError> {
        self.api_key
            .clone()
            .or(fallback)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(CliError::MissingApiKey)
    }

    pub fn news_config(&self) -> NewsConfig {
        NewsConfig {
            base_url: self.base_url.clone(),
            min_request_interval: Duration::from_millis(self.min_interval_ms),
            cache_ttl: Duration::from_secs(self.cache_ttl),
            retry: RetryPolicy::with_retries(self.retries),
            ..NewsConfig::default()
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            bypass_cache: self.no_cache,
        }
    }
}

/// Checks a country code against the remote's supported set (case-insensitive)
pub fn is_valid_country_code(code: &str) -> bool {
    VALID_COUNTRY_CODES.contains(&code.to_lowercase().as_str())
}

/// Checks a language code against the remote's supported set (case-insensitive)
pub fn is_valid_language_code(code: &str) -> bool {
    VALID_LANGUAGE_CODES.contains(&code.to_lowercase().as_str())
}

/// Parses a YYYY-MM-DD date
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_date_arg(name: &str, value: Option<&str>, errors: &mut Vec<String>) -> Option<NaiveDate> {
    let value = value?;
    let date = parse_date(value);
    if date.is_none() {
        errors.push(format!(
            "Invalid {}: Date must be in YYYY-MM-DD format, got: {}",
            name, value
        ));
    }
    date
}

//! Runtime configuration for fetching and rendering news

use std::time::Duration;

/// Base URL for the NewsAPI v2 endpoints
pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";

/// Longest accepted cache TTL (one year)
pub const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Bounded retry settings for transient failures
///
/// The delay before attempt `n` (1-based, n > 1) is
/// `min(base_delay * 2^(n-2), max_delay)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one; 1 disables retrying
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }

    /// A policy allowing `retries` extra attempts with exponential backoff
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            ..Self::none()
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Settings for talking to the news API
#[derive(Debug, Clone)]
pub struct NewsConfig {
    /// Base URL, without a trailing slash
    pub base_url: String,
    /// Minimum spacing between outbound requests
    pub min_request_interval: Duration,
    /// How long a cached response stays fresh
    pub cache_ttl: Duration,
    /// Upper bound for a single API call
    pub request_timeout: Duration,
    /// Retry policy for transport failures
    pub retry: RetryPolicy,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            min_request_interval: Duration::from_secs(1),
            cache_ttl: Duration::from_secs(300), // 5 minutes
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::none(),
        }
    }
}

/// Settings for console rendering
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub max_title_length: usize,
    pub max_description_length: usize,
    pub console_width: usize,
    /// chrono format string for published dates
    pub date_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_title_length: 80,
            max_description_length: 200,
            console_width: 80,
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

//! Fetch orchestration
//!
//! A `Fetcher` answers a query from the cache when it can, and otherwise
//! goes to the news source through the rate governor, storing successful
//! responses for later. Cache failures are logged and swallowed; source
//! failures are returned unchanged.

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, ResponseCache};
use crate::config::{NewsConfig, RetryPolicy};
use crate::data::{NewsSource, QuerySpec, ResultSet};
use crate::error::NewsError;
use crate::rate::RateGovernor;

/// Per-call options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Skip both the cache lookup and the cache write
    pub bypass_cache: bool,
}

impl FetchOptions {
    pub fn bypass_cache() -> Self {
        Self { bypass_cache: true }
    }
}

/// Composes a cache, a rate governor and a news source
pub struct Fetcher<S, C> {
    source: S,
    cache: C,
    governor: RateGovernor,
    cache_ttl: Duration,
    request_timeout: Duration,
    retry: RetryPolicy,
}

impl<S, C> Fetcher<S, C>
where
    S: NewsSource,
    C: ResponseCache,
{
    /// Creates a fetcher using the TTL, timeout and retry settings of `config`.
    ///
    /// The governor is passed in rather than built from `config` so several
    /// fetchers can share one.
    pub fn new(source: S, cache: C, governor: RateGovernor, config: &NewsConfig) -> Self {
        Self {
            source,
            cache,
            governor,
            cache_ttl: config.cache_ttl,
            request_timeout: config.request_timeout,
            retry: config.retry.clone(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Returns results for `query`.
    ///
    /// Flow: cache lookup (unless bypassed) → rate gate → source call →
    /// cache write (unless bypassed). A cache hit never touches the governor
    /// or the source.
    pub async fn fetch(
        &self,
        query: &QuerySpec,
        options: FetchOptions,
    ) -> Result<ResultSet, NewsError> {
        let key = CacheKey::for_query(query);

        if !options.bypass_cache {
            if let Some(results) = self.lookup(&key, query) {
                info!(cache_key = %key, articles = results.articles.len(), "using cached response");
                return Ok(results);
            }
            debug!(cache_key = %key, "cache miss");
        }

        let results = self.execute_with_retry(query).await?;
        info!(
            endpoint = %query.endpoint(),
            total_results = results.total_results,
            articles = results.articles.len(),
            "fetched articles"
        );

        if !options.bypass_cache {
            self.store(&key, &results);
        }

        Ok(results)
    }

    /// Fresh cached results, if any. Payloads that no longer parse are
    /// invalidated and treated as a miss.
    fn lookup(&self, key: &CacheKey, query: &QuerySpec) -> Option<ResultSet> {
        let entry = self.cache.get(key)?;
        match ResultSet::from_payload(entry.payload, query) {
            Ok(results) => Some(results),
            Err(e) => {
                warn!(cache_key = %key, error = %e, "discarding unusable cache entry");
                self.cache.invalidate(key);
                None
            }
        }
    }

    fn store(&self, key: &CacheKey, results: &ResultSet) {
        let payload = match results.to_payload_value() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(cache_key = %key, error = %e, "could not serialize response for cache");
                return;
            }
        };
        if let Err(e) = self.cache.put(key, &payload, self.cache_ttl) {
            warn!(cache_key = %key, error = %e, "failed to write cache; continuing without it");
        }
    }

    async fn execute_with_retry(&self, query: &QuerySpec) -> Result<ResultSet, NewsError> {
        let mut attempt = 1;
        loop {
            match self.execute_once(query).await {
                Ok(results) => return Ok(results),
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn execute_once(&self, query: &QuerySpec) -> Result<ResultSet, NewsError> {
        self.governor.admit().await;
        match timeout(self.request_timeout, self.source.execute(query)).await {
            Ok(result) => result,
            Err(_) => Err(NewsError::Transport(format!(
                "request timed out after {:?}",
                self.request_timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, CacheError};
    use crate::data::Article;
    use chrono::Utc;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::future::{ready, Future};
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Outcome = fn(usize) -> Result<ResultSet, NewsError>;

    /// Source returning a scripted outcome per call number (1-based)
    struct StubSource {
        calls: AtomicUsize,
        outcome: Outcome,
    }

    impl StubSource {
        fn new(outcome: Outcome) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcome,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl NewsSource for StubSource {
        fn execute(
            &self,
            query: &QuerySpec,
        ) -> impl Future<Output = Result<ResultSet, NewsError>> + Send {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let result = (self.outcome)(call).map(|mut results| {
                results.query = query.clone();
                results
            });
            ready(result)
        }
    }

    struct SlowSource;

    impl NewsSource for SlowSource {
        fn execute(
            &self,
            query: &QuerySpec,
        ) -> impl Future<Output = Result<ResultSet, NewsError>> + Send {
            let query = query.clone();
            async move {
                sleep(Duration::from_secs(5)).await;
                Ok(sample_results(query))
            }
        }
    }

    /// In-memory cache that counts calls and can refuse writes
    #[derive(Default)]
    struct CountingCache {
        gets: AtomicUsize,
        puts: AtomicUsize,
        invalidations: AtomicUsize,
        fail_puts: bool,
        entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    }

    impl CountingCache {
        fn failing() -> Self {
            Self {
                fail_puts: true,
                ..Default::default()
            }
        }

        fn insert_raw(&self, key: CacheKey, payload: Value) {
            let entry = CacheEntry {
                key: key.clone(),
                payload,
                stored_at: Utc::now(),
                ttl_secs: 300,
            };
            self.entries.lock().unwrap().insert(key, entry);
        }
    }

    impl ResponseCache for CountingCache {
        fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.entries.lock().unwrap().get(key).cloned()
        }

        fn put(&self, key: &CacheKey, payload: &Value, ttl: Duration) -> Result<(), CacheError> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            if self.fail_puts {
                return Err(CacheError::Storage(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "read-only cache",
                )));
            }
            self.insert_raw(key.clone(), payload.clone());
            self.entries.lock().unwrap().get_mut(key).unwrap().ttl_secs = ttl.as_secs();
            Ok(())
        }

        fn invalidate(&self, key: &CacheKey) {
            self.invalidations.fetch_add(1, Ordering::SeqCst);
            self.entries.lock().unwrap().remove(key);
        }
    }

    fn sample_results(query: QuerySpec) -> ResultSet {
        ResultSet {
            status: "ok".to_string(),
            total_results: 1,
            articles: vec![Article {
                source: "Test Source".to_string(),
                source_id: None,
                author: None,
                title: "Test Article".to_string(),
                description: Some("Test description".to_string()),
                url: "https://example.com/test".to_string(),
                url_to_image: None,
                published_at: None,
                content: None,
            }],
            query,
        }
    }

    fn ok_outcome(_call: usize) -> Result<ResultSet, NewsError> {
        Ok(sample_results(QuerySpec::headlines()))
    }

    fn fast_config() -> NewsConfig {
        NewsConfig {
            min_request_interval: Duration::ZERO,
            ..Default::default()
        }
    }

    fn build_fetcher<S: NewsSource>(
        source: S,
        cache: CountingCache,
        config: &NewsConfig,
    ) -> Fetcher<S, CountingCache> {
        Fetcher::new(
            source,
            cache,
            RateGovernor::new(config.min_request_interval),
            config,
        )
    }

    fn query() -> QuerySpec {
        QuerySpec::headlines()
            .with_param("category", "technology")
            .with_param("country", "us")
    }

    #[tokio::test]
    async fn test_miss_calls_source_and_stores() {
        let fetcher = build_fetcher(StubSource::new(ok_outcome), CountingCache::default(), &fast_config());

        let results = fetcher.fetch(&query(), FetchOptions::default()).await.unwrap();

        assert_eq!(results.query, query());
        assert_eq!(fetcher.source().calls(), 1);
        assert_eq!(fetcher.cache().puts.load(Ordering::SeqCst), 1);
        let stored = fetcher.cache().get(&CacheKey::for_query(&query())).unwrap();
        assert_eq!(stored.payload, results.to_payload_value().unwrap());
        assert_eq!(stored.ttl_secs, 300);
    }

    #[tokio::test]
    async fn test_hit_skips_source_and_put() {
        let fetcher = build_fetcher(StubSource::new(ok_outcome), CountingCache::default(), &fast_config());

        let first = fetcher.fetch(&query(), FetchOptions::default()).await.unwrap();
        let second = fetcher.fetch(&query(), FetchOptions::default()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fetcher.source().calls(), 1);
        assert_eq!(fetcher.cache().puts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bypass_never_touches_cache() {
        let cache = CountingCache::default();
        cache.insert_raw(
            CacheKey::for_query(&query()),
            sample_results(query()).to_payload_value().unwrap(),
        );
        let fetcher = build_fetcher(StubSource::new(ok_outcome), cache, &fast_config());

        fetcher.fetch(&query(), FetchOptions::bypass_cache()).await.unwrap();
        fetcher.fetch(&query(), FetchOptions::bypass_cache()).await.unwrap();

        assert_eq!(fetcher.source().calls(), 2);
        assert_eq!(fetcher.cache().gets.load(Ordering::SeqCst), 0);
        assert_eq!(fetcher.cache().puts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_storage_error_does_not_fail_fetch() {
        let fetcher = build_fetcher(StubSource::new(ok_outcome), CountingCache::failing(), &fast_config());

        let results = fetcher.fetch(&query(), FetchOptions::default()).await;

        assert!(results.is_ok());
        assert_eq!(fetcher.cache().puts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_api_error_is_returned_and_not_cached() {
        fn unauthorized(_call: usize) -> Result<ResultSet, NewsError> {
            Err(NewsError::Api {
                status: 401,
                code: "apiKeyInvalid".to_string(),
                message: "Your API key is invalid".to_string(),
            })
        }
        let config = NewsConfig {
            retry: RetryPolicy::with_retries(3),
            ..fast_config()
        };
        let fetcher = build_fetcher(StubSource::new(unauthorized), CountingCache::default(), &config);

        let err = fetcher.fetch(&query(), FetchOptions::default()).await.unwrap_err();

        assert!(matches!(err, NewsError::Api { status: 401, .. }));
        assert_eq!(fetcher.source().calls(), 1, "4xx must not be retried");
        assert_eq!(fetcher.cache().puts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_error_without_retry_policy() {
        fn reset(_call: usize) -> Result<ResultSet, NewsError> {
            Err(NewsError::Transport("connection reset".to_string()))
        }
        let fetcher = build_fetcher(StubSource::new(reset), CountingCache::default(), &fast_config());

        let err = fetcher.fetch(&query(), FetchOptions::default()).await.unwrap_err();

        assert!(matches!(err, NewsError::Transport(_)));
        assert_eq!(fetcher.source().calls(), 1);
        assert_eq!(fetcher.cache().puts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_error_is_retried_up_to_policy() {
        fn flaky(call: usize) -> Result<ResultSet, NewsError> {
            if call < 3 {
                Err(NewsError::Transport("connection reset".to_string()))
            } else {
                Ok(sample_results(QuerySpec::headlines()))
            }
        }
        let config = NewsConfig {
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
            },
            ..fast_config()
        };
        let fetcher = build_fetcher(StubSource::new(flaky), CountingCache::default(), &config);

        let results = fetcher.fetch(&query(), FetchOptions::default()).await;

        assert!(results.is_ok());
        assert_eq!(fetcher.source().calls(), 3);
    }

    #[tokio::test]
    async fn test_parse_error_is_not_retried() {
        fn malformed(_call: usize) -> Result<ResultSet, NewsError> {
            Err(NewsError::Parse("missing field `title`".to_string()))
        }
        let config = NewsConfig {
            retry: RetryPolicy::with_retries(2),
            ..fast_config()
        };
        let fetcher = build_fetcher(StubSource::new(malformed), CountingCache::default(), &config);

        let err = fetcher.fetch(&query(), FetchOptions::default()).await.unwrap_err();

        assert!(matches!(err, NewsError::Parse(_)));
        assert_eq!(fetcher.source().calls(), 1);
    }

    #[tokio::test]
    async fn test_unusable_cache_entry_is_invalidated_and_refetched() {
        let cache = CountingCache::default();
        cache.insert_raw(CacheKey::for_query(&query()), Value::String("garbage".to_string()));
        let fetcher = build_fetcher(StubSource::new(ok_outcome), cache, &fast_config());

        let results = fetcher.fetch(&query(), FetchOptions::default()).await;

        assert!(results.is_ok());
        assert_eq!(fetcher.source().calls(), 1);
        assert_eq!(fetcher.cache().invalidations.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.cache().puts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_source_times_out_as_transport_error() {
        let config = NewsConfig {
            request_timeout: Duration::from_millis(20),
            ..fast_config()
        };
        let fetcher = build_fetcher(SlowSource, CountingCache::default(), &config);

        let err = fetcher.fetch(&query(), FetchOptions::default()).await.unwrap_err();

        assert!(matches!(err, NewsError::Transport(_)));
        assert!(err.to_string().contains("timed out"));
        assert_eq!(fetcher.cache().puts.load(Ordering::SeqCst), 0);
    }
}

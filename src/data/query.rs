//! Query descriptions for the news API
//!
//! A `QuerySpec` is the normalized form of one search request: an endpoint
//! plus a sorted parameter map. Two specs with the same endpoint and the same
//! parameters compare equal regardless of how they were assembled.

use std::collections::BTreeMap;
use std::fmt;

/// Maximum page size accepted by the remote
pub const MAX_PAGE_SIZE: u32 = 100;

/// Which search endpoint a query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    /// Breaking headlines, filterable by country/category/sources
    TopHeadlines,
    /// Full archive search
    Everything,
}

impl Endpoint {
    /// Path segment appended to the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::TopHeadlines => "top-headlines",
            Endpoint::Everything => "everything",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// User-facing search parameters, before endpoint rules are applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub query: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    /// Comma separated source ids
    pub sources: Option<String>,
    /// Oldest article date (YYYY-MM-DD)
    pub from_date: Option<String>,
    /// Newest article date (YYYY-MM-DD)
    pub to_date: Option<String>,
    pub sort_by: Option<String>,
    pub page_size: Option<u32>,
    pub page: Option<u32>,
}

/// Immutable, normalized description of one search request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuerySpec {
    endpoint: Endpoint,
    params: BTreeMap<String, String>,
}

impl QuerySpec {
    /// Creates a spec with no parameters
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            params: BTreeMap::new(),
        }
    }

    /// Shorthand for a top-headlines spec
    pub fn headlines() -> Self {
        Self::new(Endpoint::TopHeadlines)
    }

    /// Shorthand for an everything spec
    pub fn everything() -> Self {
        Self::new(Endpoint::Everything)
    }

    /// Returns the spec with `key` set to the trimmed string form of `value`.
    ///
    /// An empty value removes the key, so "unset" and "blank" normalize to
    /// the same spec.
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        let value = value.trim();
        if value.is_empty() {
            self.params.remove(&key);
        } else {
            self.params.insert(key, value.to_string());
        }
        self
    }

    /// Builds a spec from search parameters using the remote's naming and
    /// per-endpoint rules.
    ///
    /// Headlines cannot mix `sources` with `country`/`category`, so the
    /// latter are dropped when sources are given. `pageSize` is clamped to
    /// [`MAX_PAGE_SIZE`].
    pub fn from_search(endpoint: Endpoint, search: &SearchParams) -> Self {
        let mut spec = Self::new(endpoint);
        let sources = search.sources.as_deref().and_then(normalize_sources);

        spec = spec.with_opt("q", search.query.as_deref());
        spec = spec.with_opt("language", search.language.as_deref());
        if let Some(size) = search.page_size {
            spec = spec.with_param("pageSize", size.min(MAX_PAGE_SIZE));
        }
        if let Some(page) = search.page {
            spec = spec.with_param("page", page);
        }

        match endpoint {
            Endpoint::TopHeadlines => {
                if let Some(sources) = sources {
                    spec = spec.with_param("sources", sources);
                } else {
                    spec = spec.with_opt("country", search.country.as_deref());
                    spec = spec.with_opt("category", search.category.as_deref());
                }
            }
            Endpoint::Everything => {
                spec = spec.with_opt("sources", sources.as_deref());
                spec = spec.with_opt("from", search.from_date.as_deref());
                spec = spec.with_opt("to", search.to_date.as_deref());
                spec = spec.with_opt("sortBy", search.sort_by.as_deref());
            }
        }

        spec
    }

    fn with_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.with_param(key, value),
            None => self,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Parameters in key order
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Unambiguous text form: `endpoint?k=v&k=v` with keys sorted and
    /// `%`, `&`, `=` percent-escaped inside keys and values.
    pub fn canonical_string(&self) -> String {
        let pairs: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", escape_component(k), escape_component(v)))
            .collect();
        format!("{}?{}", self.endpoint.path(), pairs.join("&"))
    }
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

/// Splits a comma separated source list, trims entries and drops empties.
///
/// Returns `None` when nothing is left.
pub fn normalize_sources(sources: &str) -> Option<String> {
    let cleaned: Vec<&str> = sources
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.join(","))
    }
}

fn escape_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '=' => out.push_str("%3D"),
            _ => out.push(c),
        }
    }
    out
}

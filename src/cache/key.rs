//! Content-derived cache keys

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::data::QuerySpec;

/// SHA-256 fingerprint of a query's canonical form, hex encoded
///
/// Equal specs always produce equal keys. The key is also the entry's file
/// stem, so distinct specs never share a storage location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Length of the hex fingerprint
    pub const LEN: usize = 64;

    /// Derives the key for a query
    pub fn for_query(query: &QuerySpec) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(query.canonical_string().as_bytes());
        CacheKey(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_fixed_length_hex() {
        let key = CacheKey::for_query(&QuerySpec::headlines().with_param("country", "us"));
        assert_eq!(key.as_str().len(), CacheKey::LEN);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_equal_specs_share_a_key() {
        let a = QuerySpec::headlines()
            .with_param("category", "technology")
            .with_param("country", "us");
        let b = QuerySpec::headlines()
            .with_param("country", "us")
            .with_param("category", "technology");
        assert_eq!(CacheKey::for_query(&a), CacheKey::for_query(&b));
    }

    #[test]
    fn test_different_specs_get_different_keys() {
        let a = QuerySpec::headlines().with_param("country", "us");
        let b = QuerySpec::headlines().with_param("country", "gb");
        let c = QuerySpec::everything().with_param("country", "us");
        assert_ne!(CacheKey::for_query(&a), CacheKey::for_query(&b));
        assert_ne!(CacheKey::for_query(&a), CacheKey::for_query(&c));
    }

    #[test]
    fn test_key_is_stable_across_runs() {
        // sha256("top-headlines?country=us")
        let key = CacheKey::for_query(&QuerySpec::headlines().with_param("country", "us"));
        let mut hasher = Sha256::new();
        hasher.update(b"top-headlines?country=us");
        assert_eq!(key.as_str(), hex::encode(hasher.finalize()));
    }
}

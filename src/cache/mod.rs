//! Cache module for storing API responses to disk
//!
//! Responses are addressed by a SHA-256 fingerprint of the normalized query
//! and expire lazily: an entry older than its TTL reads as a miss. Caching is
//! best-effort, so storage failures are reported to the caller as
//! `CacheError` but never turned into fetch failures.

mod key;
mod store;

pub use key::CacheKey;
pub use store::{CacheEntry, CacheError, CacheStore, ResponseCache, FALLBACK_CACHE_DIR};

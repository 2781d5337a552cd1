//! Disk-backed response cache
//!
//! Each entry is a JSON file named after its cache key, holding the payload
//! together with the time it was stored and its TTL. Writes go to a temporary
//! file in the same directory and are renamed into place, so readers see
//! either the old entry or the new one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use super::CacheKey;

/// Directory used when no XDG cache directory can be determined
pub const FALLBACK_CACHE_DIR: &str = ".news_cache";

/// File extension of cache entries
const ENTRY_EXTENSION: &str = "json";

/// Errors that can occur when writing to or maintaining the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Cache directory or file could not be written or read
    #[error("Cache storage unavailable: {0}")]
    Storage(#[from] io::Error),

    /// Entry could not be serialized
    #[error("Failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A stored response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    /// Opaque response payload
    pub payload: Value,
    pub stored_at: DateTime<Utc>,
    pub ttl_secs: u64,
}

impl CacheEntry {
    /// When the entry stops being fresh; `None` when that lies beyond the
    /// representable date range
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let ttl = i64::try_from(self.ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)?;
        self.stored_at.checked_add_signed(ttl)
    }

    /// An entry is expired once `now - stored_at >= ttl`. An expiry too far
    /// out to represent never arrives.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expires_at| now >= expires_at)
    }
}

/// Storage operations the fetcher needs from a cache
pub trait ResponseCache {
    /// Returns the fresh entry for `key`; missing, expired and unreadable
    /// entries all read as `None`.
    fn get(&self, key: &CacheKey) -> Option<CacheEntry>;

    /// Stores `payload` under `key`, replacing any existing entry
    fn put(&self, key: &CacheKey, payload: &Value, ttl: Duration) -> Result<(), CacheError>;

    /// Removes the entry for `key`, if any
    fn invalidate(&self, key: &CacheKey);
}

/// Manages cache entries in a directory on disk
#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_dir: PathBuf,
}

impl CacheStore {
    /// Creates a CacheStore in the XDG-compliant cache directory
    ///
    /// Uses `~/.cache/newsfetch/` on Linux. Returns `None` if no home
    /// directory can be determined.
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "newsfetch")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// XDG cache directory if available, otherwise `./.news_cache`
    pub fn with_default_dir() -> Self {
        Self::new().unwrap_or_else(|| Self::with_dir(PathBuf::from(FALLBACK_CACHE_DIR)))
    }

    /// Creates a CacheStore rooted at `cache_dir`
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the file backing `key`
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{}", key.as_str(), ENTRY_EXTENSION))
    }

    /// Like [`ResponseCache::get`], evaluated at `now`
    pub fn get_at(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(cache_key = %key, error = %e, "cache entry unreadable");
                }
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(cache_key = %key, error = %e, "discarding corrupt cache entry");
                remove_quietly(&path);
                return None;
            }
        };

        if entry.key != *key {
            warn!(cache_key = %key, stored_key = %entry.key, "cache entry key mismatch");
            return None;
        }

        if entry.is_expired_at(now) {
            debug!(cache_key = %key, expired_at = ?entry.expires_at(), "cache entry expired");
            remove_quietly(&path);
            return None;
        }

        Some(entry)
    }

    /// Writes an entry stamped with `stored_at`
    pub fn put_at(
        &self,
        key: &CacheKey,
        payload: &Value,
        ttl: Duration,
        stored_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir)?;

        let entry = CacheEntry {
            key: key.clone(),
            payload: payload.clone(),
            stored_at,
            ttl_secs: ttl.as_secs(),
        };
        let json = serde_json::to_vec_pretty(&entry)?;

        let mut tmp = NamedTempFile::new_in(&self.cache_dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.entry_path(key)).map_err(|e| e.error)?;

        debug!(cache_key = %key, ttl_secs = entry.ttl_secs, "cache entry stored");
        Ok(())
    }

    /// Removes expired and unreadable entries, returning how many were removed
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        self.purge_expired_at(Utc::now())
    }

    /// Like [`CacheStore::purge_expired`], evaluated at `now`
    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let mut removed = 0;
        for path in self.entry_files()? {
            let stale = match fs::read(&path) {
                Ok(content) => match serde_json::from_slice::<CacheEntry>(&content) {
                    Ok(entry) => entry.is_expired_at(now),
                    Err(_) => true,
                },
                Err(_) => true,
            };
            if stale && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        debug!(removed, "purged expired cache entries");
        Ok(removed)
    }

    /// Removes every entry, returning how many were removed.
    ///
    /// Files that cannot be deleted are skipped and logged; the rest are
    /// still removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let (removed, failed) = remove_files(&self.entry_files()?);
        debug!(removed, failed, "cleared cache");
        Ok(removed)
    }

    /// Entry files in the cache directory; a missing directory has none
    fn entry_files(&self) -> Result<Vec<PathBuf>, CacheError> {
        let dir = match fs::read_dir(&self.cache_dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for item in dir {
            let path = item?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// Deletes each path, carrying on past failures. Returns `(removed, failed)`.
fn remove_files(paths: &[PathBuf]) -> (usize, usize) {
    let mut removed = 0;
    let mut failed = 0;
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not remove cache entry");
                failed += 1;
            }
        }
    }
    (removed, failed)
}

impl ResponseCache for CacheStore {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.get_at(key, Utc::now())
    }

    fn put(&self, key: &CacheKey, payload: &Value, ttl: Duration) -> Result<(), CacheError> {
        self.put_at(key, payload, ttl, Utc::now())
    }

    fn invalidate(&self, key: &CacheKey) {
        remove_quietly(&self.entry_path(key));
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove cache file");
        }
    }
}

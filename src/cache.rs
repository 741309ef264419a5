//! File-based cache for threat-intel feed bodies.
//!
//! Each feed is stored as one JSON file holding the raw body and the time it
//! was fetched. Freshness is decided by the caller against its own clock, so
//! an entry is never deleted for being old: an expired copy is still useful
//! when the network is down.
//!
//! # Cache Location
//!
//! The cache is stored in platform-specific directories:
//! - Linux: `~/.cache/hulud-detect/`
//! - macOS: `~/Library/Caches/hulud-detect/`
//! - Windows: `%LOCALAPPDATA%\hulud-detect\`
//!
//! # Example
//!
//! ```no_run
//! use hulud_detect::cache::{CachedFeed, FeedCache};
//!
//! let cache = FeedCache::new();
//! let entry = CachedFeed::new("left-pad\n".to_string(), chrono::Utc::now());
//! cache.set("feed_csv", &entry).unwrap();
//!
//! let value: Option<CachedFeed> = cache.get("feed_csv");
//! assert!(value.is_some());
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::platform::cache_dir;

/// A feed body together with the moment it was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFeed {
    pub fetched_at: DateTime<Utc>,
    pub body: String,
}

impl CachedFeed {
    pub fn new(body: String, fetched_at: DateTime<Utc>) -> Self {
        Self { fetched_at, body }
    }

    /// True while the entry is younger than `ttl` as seen from `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now.signed_duration_since(self.fetched_at) < ttl
    }
}

/// A directory of JSON-serialized cache entries.
pub struct FeedCache {
    dir: PathBuf,
}

impl FeedCache {
    /// Creates a cache in the platform cache directory.
    pub fn new() -> Self {
        Self { dir: cache_dir() }
    }

    /// Creates a cache rooted at `dir`.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("Failed to create cache directory {:?}", self.dir))?;
        }
        Ok(())
    }

    /// Converts a cache key to a safe filename.
    fn cache_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", safe_key))
    }

    /// Retrieves a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist or can't be deserialized.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let content = fs::read_to_string(self.cache_path(key)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Stores a value in the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created or
    /// the file cannot be written.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.cache_path(key);
        let content = serde_json::to_string(value)?;
        fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    /// Removes all cached entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be read.
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            for entry in fs::read_dir(&self.dir)?.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    let _ = fs::remove_file(path);
                }
            }
        }
        Ok(())
    }
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::at(dir.path().join("nested"));
        let at = Utc.with_ymd_and_hms(2025, 11, 24, 12, 0, 0).unwrap();

        cache
            .set("feed/json", &CachedFeed::new("{}".to_string(), at))
            .unwrap();
        let back: CachedFeed = cache.get("feed/json").unwrap();
        assert_eq!(back.fetched_at, at);
        assert_eq!(back.body, "{}");

        cache.clear().unwrap();
        assert!(cache.get::<CachedFeed>("feed/json").is_none());
    }

    #[test]
    fn test_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::at(dir.path());
        assert!(cache.get::<CachedFeed>("nope").is_none());
    }

    #[test]
    fn test_freshness() {
        let at = Utc.with_ymd_and_hms(2025, 11, 24, 12, 0, 0).unwrap();
        let entry = CachedFeed::new(String::new(), at);
        let ttl = Duration::minutes(30);

        assert!(entry.is_fresh(at + Duration::minutes(29), ttl));
        assert!(!entry.is_fresh(at + Duration::minutes(30), ttl));
        assert!(!entry.is_fresh(at + Duration::hours(2), ttl));
    }
}

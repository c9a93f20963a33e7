//! Time-stamped JSON cache on disk
//!
//! Each key is one file holding `{ "timestamp": <epoch ms>, "data": ... }`.
//! Entries older than the TTL, or that fail to parse, are removed on read.

pub mod clock;

pub use clock::{Clock, SystemClock};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cache key for the full listing catalog
pub const ALL_PROPERTIES_KEY: &str = "AllProperties";
/// Cache key for the curated homepage subsets
pub const HOME_KEY: &str = "Home";

/// Default freshness window (1 hour)
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub timestamp: i64,
    pub data: T,
}

pub struct CacheStore {
    dir: PathBuf,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("dir", &self.dir)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self::with_clock(dir, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(dir: impl Into<PathBuf>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            clock,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Fresh entries are strictly younger than the TTL
    pub fn is_valid(&self, timestamp: i64, now: i64) -> bool {
        let age = now.saturating_sub(timestamp);
        age < self.ttl.as_millis() as i64
    }

    /// Read a fresh entry; stale or corrupt entries are deleted and yield `None`
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read cache entry {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str::<CachedData<T>>(&raw) {
            Ok(cached) if self.is_valid(cached.timestamp, self.clock.now_millis()) => {
                debug!("Cache hit for {}", key);
                Some(cached.data)
            }
            Ok(_) => {
                debug!("Cache entry {} expired", key);
                self.remove(key).await;
                None
            }
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                self.remove(key).await;
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create cache dir {}", self.dir.display()))?;

        let cached = CachedData {
            timestamp: self.clock.now_millis(),
            data,
        };
        let json = serde_json::to_string(&cached).context("Failed to serialize cache value")?;
        tokio::fs::write(self.path_for(key), json)
            .await
            .with_context(|| format!("Failed to write cache entry {}", key))?;
        debug!("Stored cache entry {}", key);
        Ok(())
    }

    pub async fn remove(&self, key: &str) {
        if let Err(e) = tokio::fs::remove_file(self.path_for(key)).await {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove cache entry {}: {}", key, e);
            }
        }
    }
}

//! Job cache backends.

use crate::compression::{compress, decompress};
use crate::keys::sanitize_key;
use crate::types::{CacheBackend, CacheConfig, CacheRecord, CacheStats, CompressionType};
use assetpress_core::ports::JobCache;
use assetpress_core::{CachedAsset, Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    expired: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

struct MemoryEntry {
    value: CachedAsset,
    expires_at: Instant,
}

/// Writes between sweeps of expired memory entries.
pub const DEFAULT_PURGE_INTERVAL: u64 = 256;

/// In-process cache. Visible to every task and thread holding the same
/// instance, but not to other processes.
///
/// Expired entries are dropped when read, and swept from the whole map
/// every `purge_interval` writes so keys that are never read again do not
/// accumulate.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    counters: Counters,
    purge_interval: u64,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self {
            entries: RwLock::default(),
            counters: Counters::default(),
            purge_interval: DEFAULT_PURGE_INTERVAL,
        }
    }
}

fn sweep(entries: &mut HashMap<String, MemoryEntry>, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| entry.expires_at > now);
    before - entries.len()
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sweep every `interval` writes; zero disables the sweep.
    pub fn with_purge_interval(mut self, interval: u64) -> Self {
        self.purge_interval = interval;
        self
    }

    /// Drop every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let removed = sweep(&mut *self.entries.write().await, Instant::now());
        self.counters
            .expired
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

#[async_trait]
impl JobCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CachedAsset>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => {
                    Counters::bump(&self.counters.hits);
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
                None => {
                    Counters::bump(&self.counters.misses);
                    return Ok(None);
                }
            }
        }

        // Expired: remove unless a writer replaced it in the meantime.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
            Counters::bump(&self.counters.expired);
        }
        Counters::bump(&self.counters.misses);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &CachedAsset, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let entry = MemoryEntry {
            value: value.clone(),
            expires_at: now + ttl,
        };
        let writes = self.counters.writes.fetch_add(1, Ordering::Relaxed) + 1;

        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), entry);
        if self.purge_interval > 0 && writes % self.purge_interval == 0 {
            let removed = sweep(&mut entries, now);
            if removed > 0 {
                self.counters
                    .expired
                    .fetch_add(removed as u64, Ordering::Relaxed);
                debug!(removed, remaining = entries.len(), "Swept expired entries");
            }
        }
        drop(entries);
        debug!(key = %key, state = %value.state().as_str(), ttl_secs = ttl.as_secs(), "Cache set");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    fn is_shared(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// One file per key under a directory, readable by any process on the host.
///
/// Writes go to a temporary file that is renamed into place, so readers see
/// either the old record or the new one.
pub struct FilesystemCache {
    root_dir: PathBuf,
    compression: CompressionType,
    counters: Counters,
}

impl FilesystemCache {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            compression: CompressionType::None,
            counters: Counters::default(),
        }
    }

    pub fn with_compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    /// Platform cache directory, falling back to the system temp dir.
    pub fn default_dir() -> PathBuf {
        directories::ProjectDirs::from("dev", "assetpress", "assetpress")
            .map(|dirs| dirs.cache_dir().join("jobs"))
            .unwrap_or_else(|| std::env::temp_dir().join("assetpress-jobs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root_dir
            .join(format!("{}.{}", sanitize_key(key), self.compression.extension()))
    }

    /// Remove every record in the cache directory.
    pub async fn clear(&self) -> Result<usize> {
        if !tokio::fs::try_exists(&self.root_dir).await? {
            return Ok(0);
        }

        let suffix = format!(".{}", self.compression.extension());
        let mut removed = 0;
        let mut read_dir = tokio::fs::read_dir(&self.root_dir)
            .await
            .map_err(|e| Error::Cache(format!("Failed to read cache dir: {}", e)))?;

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| Error::Cache(format!("Failed to read entry: {}", e)))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(&suffix) {
                tokio::fs::remove_file(entry.path())
                    .await
                    .map_err(|e| Error::Cache(format!("Failed to delete cache: {}", e)))?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Cache(format!("Failed to read cache: {}", e))),
        }
    }

    fn decode_record(&self, bytes: &[u8]) -> Result<CacheRecord> {
        let raw = decompress(bytes, self.compression)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Read the record at `path`. A record that fails to decompress or parse
    /// is removed and reads as absent, so the key can be written again.
    async fn read_record(&self, path: &Path) -> Result<Option<CacheRecord>> {
        let Some(bytes) = self.read_bytes(path).await? else {
            return Ok(None);
        };

        match self.decode_record(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding unreadable cache record");
                if let Err(e) = tokio::fs::remove_file(path).await {
                    debug!(path = %path.display(), error = %e, "Unreadable record already gone");
                }
                Ok(None)
            }
        }
    }

    /// Remove the record at `path` only if it is still the one stored at
    /// `stored_at`; a record renamed into place since then is kept.
    async fn remove_if_unchanged(&self, path: &Path, stored_at: DateTime<Utc>) {
        let current = match self.read_bytes(path).await {
            Ok(Some(bytes)) => self.decode_record(&bytes).ok(),
            _ => return,
        };
        if current.is_some_and(|record| record.stored_at != stored_at) {
            debug!(path = %path.display(), "Record replaced since read, keeping it");
            return;
        }
        if let Err(e) = tokio::fs::remove_file(path).await {
            debug!(path = %path.display(), error = %e, "Expired record already gone");
        }
    }
}

#[async_trait]
impl JobCache for FilesystemCache {
    async fn get(&self, key: &str) -> Result<Option<CachedAsset>> {
        let path = self.key_path(key);
        let Some(record) = self.read_record(&path).await? else {
            Counters::bump(&self.counters.misses);
            return Ok(None);
        };

        if record.is_expired(Utc::now()) {
            Counters::bump(&self.counters.expired);
            Counters::bump(&self.counters.misses);
            self.remove_if_unchanged(&path, record.stored_at).await;
            return Ok(None);
        }

        Counters::bump(&self.counters.hits);
        Ok(Some(record.value))
    }

    async fn set(&self, key: &str, value: &CachedAsset, ttl: Duration) -> Result<()> {
        tokio::fs::create_dir_all(&self.root_dir)
            .await
            .map_err(|e| Error::Cache(format!("Failed to create cache dir: {}", e)))?;

        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| Error::Cache(format!("Invalid TTL: {}", e)))?;
        let now = Utc::now();
        let record = CacheRecord {
            key: key.to_string(),
            value: value.clone(),
            stored_at: now,
            expires_at: now + ttl,
        };

        let raw = serde_json::to_vec(&record)?;
        let bytes = compress(&raw, self.compression)?;

        let path = self.key_path(key);
        let tmp = self
            .root_dir
            .join(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| Error::Cache(format!("Failed to write cache: {}", e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Error::Cache(format!("Failed to commit cache: {}", e)))?;

        Counters::bump(&self.counters.writes);
        debug!(key = %key, state = %value.state().as_str(), path = %path.display(), "Cache set");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.key_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Cache(format!("Failed to delete cache: {}", e))),
        }
    }

    fn is_shared(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "filesystem"
    }
}

/// Build the configured cache backend.
pub fn build_cache(config: &CacheConfig) -> Result<Arc<dyn JobCache>> {
    match config.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryCache::new())),
        CacheBackend::Filesystem => {
            let dir = config
                .directory
                .clone()
                .unwrap_or_else(FilesystemCache::default_dir);
            std::fs::create_dir_all(&dir).map_err(|e| {
                Error::Config(format!("Cannot create cache dir {}: {}", dir.display(), e))
            })?;
            Ok(Arc::new(
                FilesystemCache::new(dir).with_compression(config.compression),
            ))
        }
    }
}

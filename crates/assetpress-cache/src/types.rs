//! Cache configuration and stored record types.

use assetpress_core::CachedAsset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which job cache backend to build.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process map; invisible to other processes.
    #[default]
    Memory,
    /// One file per key under a directory; shared between processes.
    Filesystem,
}

/// Compression applied to records written by the filesystem backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    #[default]
    None,
    Zstd,
    Gzip,
    Lz4,
}

impl CompressionType {
    /// File extension for records stored with this compression.
    pub fn extension(&self) -> &'static str {
        match self {
            CompressionType::None => "json",
            CompressionType::Zstd => "json.zst",
            CompressionType::Gzip => "json.gz",
            CompressionType::Lz4 => "json.lz4",
        }
    }
}

/// Job cache configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Directory for the filesystem backend. Defaults to the user cache dir.
    pub directory: Option<PathBuf>,
    pub compression: CompressionType,
}

/// A cached value with its absolute expiry, as persisted on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub key: String,
    pub value: CachedAsset,
    pub stored_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub expired: u64,
}

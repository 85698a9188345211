//! Port traits (hexagonal architecture).
//!
//! These traits define the interfaces between the compression engine and
//! its external collaborators.

use crate::asset::CachedAsset;
use crate::ids::JobId;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shared key-value store used both as result cache and as the in-flight
/// marker for dispatched jobs.
///
/// Only last-writer-wins per key is required; there is no compare-and-swap.
#[async_trait]
pub trait JobCache: Send + Sync {
    /// Get the live value for a key. Expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<CachedAsset>>;

    /// Store a value, replacing any previous one, expiring after `ttl`.
    async fn set(&self, key: &str, value: &CachedAsset, ttl: Duration) -> Result<()>;

    /// Remove a key.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Whether writes are visible to other processes.
    fn is_shared(&self) -> bool;

    /// Backend name for logs.
    fn name(&self) -> &str;
}

/// External compressor backend.
#[async_trait]
pub trait Compressor: Send + Sync {
    /// Compress source text. Fails with `Error::Compression`.
    async fn compress(&self, source: &str) -> Result<String>;

    /// Backend name for logs.
    fn name(&self) -> &str;
}

/// Out-of-band channel for job failures.
#[async_trait]
pub trait FailureNotifier: Send + Sync {
    async fn notify(&self, report: &FailureReport) -> Result<()>;
}

/// Failure details sent to operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReport {
    pub job_id: JobId,
    pub key: String,
    pub job_name: String,
    pub backend: String,
    pub error: String,
    pub occurred_at: DateTime<Utc>,
}

impl FailureReport {
    pub fn new(
        job_id: JobId,
        key: impl Into<String>,
        job_name: impl Into<String>,
        backend: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            key: key.into(),
            job_name: job_name.into(),
            backend: backend.into(),
            error: error.into(),
            occurred_at: Utc::now(),
        }
    }

    pub fn title(&self) -> String {
        "Code compressor job failed".to_string()
    }

    pub fn body(&self) -> String {
        format!(
            "Job {} ({}) using backend '{}' failed for key {}: {}",
            self.job_id, self.job_name, self.backend, self.key, self.error
        )
    }
}

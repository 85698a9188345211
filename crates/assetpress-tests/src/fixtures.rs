//! Stand-in collaborators and sample content.

use assetpress_core::ports::{Compressor, FailureNotifier, FailureReport, JobCache};
use assetpress_core::{AssetState, CachedAsset, Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Sample JS files, written under `js/` by [`write_content_root`].
pub const JS_FILES: &[(&str, &str)] = &[
    ("js/a.js", "var alpha = 1;"),
    ("js/b.js", "var beta = 2;"),
];

/// Sample CSS file, written under `css/`.
pub const CSS_FILES: &[(&str, &str)] = &[("css/site.css", "body { color: red; }")];

/// Create a content root holding [`JS_FILES`] and [`CSS_FILES`].
pub fn write_content_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("Failed to create content root");
    for (name, body) in JS_FILES.iter().chain(CSS_FILES) {
        write_file(dir.path(), name, body);
    }
    dir
}

pub fn write_file(root: &Path, name: &str, body: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create content dir");
    }
    std::fs::write(path, body).expect("Failed to write content file");
}

/// Upper-cases its input, optionally waiting for a permit first.
pub struct UppercaseCompressor {
    gate: Option<Arc<Semaphore>>,
}

impl UppercaseCompressor {
    pub fn new() -> Self {
        Self { gate: None }
    }

    /// Hold every job until the returned semaphore receives a permit.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (
            Self {
                gate: Some(gate.clone()),
            },
            gate,
        )
    }
}

impl Default for UppercaseCompressor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Compressor for UppercaseCompressor {
    async fn compress(&self, source: &str) -> Result<String> {
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| Error::Compression(e.to_string()))?;
            permit.forget();
        }
        Ok(source.to_uppercase())
    }

    fn name(&self) -> &str {
        "uppercase"
    }
}

/// Fails every job with a fixed diagnostic.
pub struct FailingCompressor;

pub const FAILING_DIAGNOSTIC: &str = "syntax error at line 1";

#[async_trait]
impl Compressor for FailingCompressor {
    async fn compress(&self, _source: &str) -> Result<String> {
        Err(Error::Compression(FAILING_DIAGNOSTIC.to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Keeps every report it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    reports: Mutex<Vec<FailureReport>>,
}

impl RecordingNotifier {
    pub fn reports(&self) -> Vec<FailureReport> {
        self.reports.lock().expect("notifier lock").clone()
    }
}

#[async_trait]
impl FailureNotifier for RecordingNotifier {
    async fn notify(&self, report: &FailureReport) -> Result<()> {
        self.reports.lock().expect("notifier lock").push(report.clone());
        Ok(())
    }
}

/// Wraps a cache and logs every write as `(key, state, ttl)`.
pub struct RecordingCache {
    inner: Arc<dyn JobCache>,
    writes: Mutex<Vec<(String, AssetState, Duration)>>,
}

impl RecordingCache {
    pub fn new(inner: Arc<dyn JobCache>) -> Self {
        Self {
            inner,
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn writes(&self) -> Vec<(String, AssetState, Duration)> {
        self.writes.lock().expect("cache lock").clone()
    }

    /// Writes to `key` that no later write is expected to follow.
    pub fn terminal_writes(&self, key: &str) -> usize {
        self.writes()
            .iter()
            .filter(|(k, state, _)| k == key && *state != AssetState::Processing)
            .count()
    }
}

#[async_trait]
impl JobCache for RecordingCache {
    async fn get(&self, key: &str) -> Result<Option<CachedAsset>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &CachedAsset, ttl: Duration) -> Result<()> {
        self.writes
            .lock()
            .expect("cache lock")
            .push((key.to_string(), value.state(), ttl));
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }

    fn is_shared(&self) -> bool {
        self.inner.is_shared()
    }

    fn name(&self) -> &str {
        "recording"
    }
}

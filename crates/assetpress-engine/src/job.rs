//! Background compression job.

use crate::config::EngineConfig;
use assetpress_compress::Compressors;
use assetpress_core::ports::{FailureNotifier, FailureReport, JobCache};
use assetpress_core::{AssetKind, CachedAsset, Error, JobId, Result};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Instrument, error, info, info_span, warn};

/// Everything a worker needs to compress one unit of source text. Sent as
/// JSON to worker processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub job_id: JobId,
    pub key: String,
    pub name: String,
    pub kind: AssetKind,
    pub source: String,
}

impl JobSpec {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        kind: AssetKind,
        source: impl Into<String>,
    ) -> Self {
        Self {
            job_id: JobId::new(),
            key: key.into(),
            name: name.into(),
            kind,
            source: source.into(),
        }
    }
}

/// How a job ended, when it ended without propagating an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// `Ready` record written.
    Compressed,
    /// The backend produced no output; the cache was left alone.
    Unchanged,
    /// `Failed` record written and operators notified.
    Failed(String),
}

/// Collaborators shared by every job a dispatcher runs.
pub struct JobContext {
    cache: Arc<dyn JobCache>,
    compressors: Compressors,
    notifier: Arc<dyn FailureNotifier>,
    success_ttl: Duration,
    failure_ttl: Duration,
    debug: bool,
}

impl JobContext {
    pub fn new(
        cache: Arc<dyn JobCache>,
        compressors: Compressors,
        notifier: Arc<dyn FailureNotifier>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            cache,
            compressors,
            notifier,
            success_ttl: config.success_ttl(),
            failure_ttl: config.pending_ttl(),
            debug: config.debug,
        }
    }

    /// Run one job to completion.
    ///
    /// Every path that does not produce output writes a terminal record
    /// before returning, including a panicking compressor. In debug mode
    /// the failure is returned as `Err` after that write; otherwise it is
    /// reported to the notifier and the job returns `JobOutcome::Failed`.
    pub async fn run(&self, spec: JobSpec) -> Result<JobOutcome> {
        let span = info_span!(
            "compression_job",
            job_id = %spec.job_id,
            key = %spec.key,
            job = %spec.name,
        );
        self.run_inner(spec).instrument(span).await
    }

    async fn run_inner(&self, spec: JobSpec) -> Result<JobOutcome> {
        let compressor = self.compressors.for_kind(spec.kind);
        let backend = compressor.name().to_string();
        let started = Instant::now();
        info!(backend = %backend, bytes = spec.source.len(), "Compression job started");

        let result = match AssertUnwindSafe(compressor.compress(&spec.source))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(Error::Compression(format!(
                "{} panicked: {}",
                backend,
                panic_message(panic.as_ref())
            ))),
        };

        let output = match result {
            Ok(output) => output,
            Err(e) => return self.fail(&spec, &backend, e).await,
        };

        if output.is_empty() {
            warn!(backend = %backend, "Compressor returned no output, leaving cache untouched");
            return Ok(JobOutcome::Unchanged);
        }

        let record = CachedAsset::ready(&spec.name, output);
        if let Err(e) = self.cache.set(&spec.key, &record, self.success_ttl).await {
            return self.fail(&spec, &backend, e).await;
        }

        info!(
            backend = %backend,
            duration_ms = started.elapsed().as_millis() as u64,
            "Compression job finished"
        );
        Ok(JobOutcome::Compressed)
    }

    async fn fail(&self, spec: &JobSpec, backend: &str, err: Error) -> Result<JobOutcome> {
        let diagnostic = err.to_string();
        error!(backend = %backend, error = %diagnostic, "Compression job failed");

        let record = CachedAsset::failed(&spec.source, &diagnostic);
        self.cache.set(&spec.key, &record, self.failure_ttl).await?;

        if self.debug {
            return Err(err);
        }

        let report = FailureReport::new(spec.job_id, &spec.key, &spec.name, backend, &diagnostic);
        if let Err(e) = self.notifier.notify(&report).await {
            warn!(error = %e, "Failure notification not delivered");
        }
        Ok(JobOutcome::Failed(diagnostic))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

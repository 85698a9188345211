//! Fire-and-forget job dispatch.
//!
//! A dispatcher only schedules; it never waits for the job. The job talks to
//! the caller exclusively through the job cache.

use crate::config::{EngineConfig, ExecutionStrategy};
use crate::job::{JobContext, JobOutcome, JobSpec};
use assetpress_core::{Error, Result};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info};

/// Schedules a compression job without waiting for it.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, spec: JobSpec) -> Result<()>;

    fn name(&self) -> &'static str;
}

fn log_outcome(spec_key: &str, result: Result<JobOutcome>) {
    match result {
        Ok(outcome) => debug!(key = %spec_key, outcome = ?outcome, "Job ended"),
        Err(e) => error!(key = %spec_key, error = %e, "Job returned an error"),
    }
}

/// Runs jobs as tasks on the current tokio runtime.
pub struct TaskDispatcher {
    context: Arc<JobContext>,
}

impl TaskDispatcher {
    pub fn new(context: Arc<JobContext>) -> Self {
        Self { context }
    }
}

impl Dispatcher for TaskDispatcher {
    fn dispatch(&self, spec: JobSpec) -> Result<()> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Dispatch(format!("No runtime for task dispatch: {}", e)))?;
        let context = self.context.clone();
        handle.spawn(async move {
            let key = spec.key.clone();
            log_outcome(&key, context.run(spec).await);
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "task"
    }
}

/// Runs each job on its own OS thread with a current-thread runtime, so a
/// slow or blocking backend never occupies the caller's runtime.
pub struct ThreadDispatcher {
    context: Arc<JobContext>,
}

impl ThreadDispatcher {
    pub fn new(context: Arc<JobContext>) -> Self {
        Self { context }
    }
}

impl Dispatcher for ThreadDispatcher {
    fn dispatch(&self, spec: JobSpec) -> Result<()> {
        let context = self.context.clone();
        std::thread::Builder::new()
            .name("assetpress-job".to_string())
            .spawn(move || {
                let key = spec.key.clone();
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!(key = %key, error = %e, "Failed to build job runtime");
                        return;
                    }
                };
                log_outcome(&key, runtime.block_on(context.run(spec)));
            })
            .map_err(|e| Error::Dispatch(format!("Failed to spawn job thread: {}", e)))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "thread"
    }
}

/// Runs each job in a fresh worker process, writing the [`JobSpec`] as JSON
/// to its stdin. The worker must reach the same shared cache.
pub struct ProcessDispatcher {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessDispatcher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The running executable invoked as `<exe> job`.
    pub fn current_exe() -> Result<Self> {
        let exe = std::env::current_exe()
            .map_err(|e| Error::Dispatch(format!("Cannot locate worker executable: {}", e)))?;
        Ok(Self::new(exe).with_args(["job"]))
    }
}

impl Dispatcher for ProcessDispatcher {
    fn dispatch(&self, spec: JobSpec) -> Result<()> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Dispatch(format!("No runtime for process dispatch: {}", e)))?;
        let input = serde_json::to_vec(&spec)?;

        // Spawning needs the runtime's reactor.
        let _guard = handle.enter();
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                Error::Dispatch(format!(
                    "Failed to spawn worker {}: {}",
                    self.program.display(),
                    e
                ))
            })?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Dispatch("Worker stdin unavailable".to_string()))?;

        info!(key = %spec.key, job_id = %spec.job_id, pid = ?child.id(), "Dispatched job to worker process");

        let key = spec.key;
        handle.spawn(async move {
            if let Err(e) = stdin.write_all(&input).await {
                error!(key = %key, error = %e, "Failed to send job to worker");
            }
            drop(stdin);
            match child.wait().await {
                Ok(status) if status.success() => debug!(key = %key, "Worker exited"),
                Ok(status) => error!(key = %key, status = %status, "Worker failed"),
                Err(e) => error!(key = %key, error = %e, "Failed to wait for worker"),
            }
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "process"
    }
}

/// Build the dispatcher for the configured strategy.
pub fn create_dispatcher(
    config: &EngineConfig,
    context: Arc<JobContext>,
) -> Result<Arc<dyn Dispatcher>> {
    let dispatcher: Arc<dyn Dispatcher> = match config.strategy {
        ExecutionStrategy::Task => Arc::new(TaskDispatcher::new(context)),
        ExecutionStrategy::Thread => Arc::new(ThreadDispatcher::new(context)),
        ExecutionStrategy::Process => {
            let worker = match &config.worker_program {
                Some(program) => ProcessDispatcher::new(program).with_args(["job"]),
                None => ProcessDispatcher::current_exe()?,
            };
            Arc::new(worker)
        }
    };
    Ok(dispatcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetpress_cache::MemoryCache;
    use assetpress_compress::Compressors;
    use assetpress_core::ports::{Compressor, FailureNotifier, FailureReport, JobCache};
    use assetpress_core::{AssetKind, AssetState};
    use async_trait::async_trait;
    use std::time::Duration;

    struct Upper;

    #[async_trait]
    impl Compressor for Upper {
        async fn compress(&self, source: &str) -> Result<String> {
            Ok(source.to_uppercase())
        }

        fn name(&self) -> &str {
            "upper"
        }
    }

    struct Quiet;

    #[async_trait]
    impl FailureNotifier for Quiet {
        async fn notify(&self, _report: &FailureReport) -> Result<()> {
            Ok(())
        }
    }

    fn context(cache: Arc<MemoryCache>) -> Arc<JobContext> {
        let compressor: Arc<dyn Compressor> = Arc::new(Upper);
        Arc::new(JobContext::new(
            cache,
            Compressors::new(compressor.clone(), compressor),
            Arc::new(Quiet),
            &EngineConfig::default(),
        ))
    }

    async fn wait_ready(cache: &MemoryCache, key: &str) -> String {
        for _ in 0..200 {
            if let Some(record) = cache.get(key).await.unwrap() {
                if record.state() == AssetState::Ready {
                    return record.render();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job for {key} never finished");
    }

    #[tokio::test]
    async fn test_task_dispatch() {
        let cache = Arc::new(MemoryCache::new());
        let dispatcher = TaskDispatcher::new(context(cache.clone()));

        dispatcher
            .dispatch(JobSpec::new("k1", "k1", AssetKind::Js, "var a;"))
            .unwrap();
        assert!(wait_ready(&cache, "k1").await.ends_with("VAR A;"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_thread_dispatch() {
        let cache = Arc::new(MemoryCache::new());
        let dispatcher = ThreadDispatcher::new(context(cache.clone()));

        dispatcher
            .dispatch(JobSpec::new("k2", "k2", AssetKind::Css, "a{color:red}"))
            .unwrap();
        assert!(wait_ready(&cache, "k2").await.ends_with("A{COLOR:RED}"));
    }

    #[tokio::test]
    async fn test_process_dispatch_sends_spec_on_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("spec.json");
        let dispatcher = ProcessDispatcher::new("sh")
            .with_args(["-c".to_string(), format!("cat > {}", out.display())]);

        let spec = JobSpec::new("k3", "k3", AssetKind::Js, "var b;");
        dispatcher.dispatch(spec.clone()).unwrap();

        for _ in 0..200 {
            if let Ok(text) = std::fs::read_to_string(&out) {
                if let Ok(received) = serde_json::from_str::<JobSpec>(&text) {
                    assert_eq!(received, spec);
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("worker never received the job");
    }

    #[test]
    fn test_task_dispatch_outside_runtime() {
        let dispatcher = TaskDispatcher::new(context(Arc::new(MemoryCache::new())));
        let err = dispatcher
            .dispatch(JobSpec::new("k4", "k4", AssetKind::Js, "x"))
            .unwrap_err();
        assert!(matches!(err, Error::Dispatch(_)));
    }

    #[test]
    fn test_create_dispatcher_per_strategy() {
        let ctx = context(Arc::new(MemoryCache::new()));
        for (strategy, name) in [
            (ExecutionStrategy::Task, "task"),
            (ExecutionStrategy::Thread, "thread"),
            (ExecutionStrategy::Process, "process"),
        ] {
            let config = EngineConfig::default().with_strategy(strategy);
            assert_eq!(create_dispatcher(&config, ctx.clone()).unwrap().name(), name);
        }
    }
}

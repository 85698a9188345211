//! Cache-first compression coordinator.

use crate::config::EngineConfig;
use crate::dispatcher::Dispatcher;
use crate::job::JobSpec;
use assetpress_cache::keys::{content_hash, content_key, group_key};
use assetpress_core::ports::JobCache;
use assetpress_core::{AssetKind, CachedAsset, Result, Served};
use assetpress_fingerprint::Payload;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Suffix separating append records from compressed records of the same
/// group and signature.
const APPEND_KEY_SUFFIX: &str = "_append";

/// One unit of source text to serve compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressRequest {
    pub kind: AssetKind,
    /// `None` disables caching for this call.
    pub key: Option<String>,
    pub name: String,
    pub content: String,
}

impl CompressRequest {
    /// Inline source keyed by its content hash.
    pub fn inline(kind: AssetKind, content: impl Into<String>) -> Self {
        let content = content.into();
        let (key, name) = if content.is_empty() {
            (None, String::new())
        } else {
            (Some(content_key(&content)), content_hash(&content))
        };
        Self {
            kind,
            key,
            name,
            content,
        }
    }

    /// The concatenated files of a payload, keyed by group and signature.
    pub fn for_payload(payload: &Payload, content: impl Into<String>, key_format: &str) -> Self {
        Self {
            kind: payload.kind(),
            key: Some(group_key(key_format, payload.group(), payload.signature())),
            name: payload.name(),
            content: content.into(),
        }
    }
}

/// Serves compressed text from the job cache, dispatching a background job
/// on a miss. No call ever waits for a compressor.
///
/// Two callers missing the same key at the same moment may both dispatch.
/// Both jobs write the same terminal record, so the later write wins and the
/// duplicate only costs compressor time.
pub struct Coordinator {
    cache: Arc<dyn JobCache>,
    dispatcher: Arc<dyn Dispatcher>,
    config: EngineConfig,
}

impl Coordinator {
    pub fn new(
        cache: Arc<dyn JobCache>,
        dispatcher: Arc<dyn Dispatcher>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate(cache.as_ref())?;
        info!(
            cache = %cache.name(),
            strategy = %dispatcher.name(),
            disabled = config.disabled,
            "Coordinator ready"
        );
        Ok(Self {
            cache,
            dispatcher,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Serve `request.content` compressed if the cache already has it.
    ///
    /// A hit returns the cached record as-is, including `Processing` and
    /// `Failed` records. A miss writes a `Processing` placeholder, dispatches
    /// a job and returns the original text. Cache faults degrade to the
    /// original text.
    pub async fn compress(&self, request: CompressRequest) -> Result<Served> {
        let CompressRequest {
            kind,
            key,
            name,
            content,
        } = request;

        let key = match key {
            Some(key) if !content.is_empty() => key,
            _ => return Ok(Served::Original(content)),
        };

        if self.config.disabled {
            return Ok(Served::Original(content));
        }

        match self.cache.get(&key).await {
            Ok(Some(cached)) => {
                debug!(key = %key, state = %cached.state().as_str(), "Cache hit");
                return Ok(Served::Cached(cached));
            }
            Ok(None) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, serving original");
                return Ok(Served::Original(content));
            }
        }

        let placeholder = CachedAsset::processing(kind, content.as_str());
        if let Err(e) = self
            .cache
            .set(&key, &placeholder, self.config.pending_ttl())
            .await
        {
            warn!(key = %key, error = %e, "Placeholder write failed, serving original");
            return Ok(Served::Original(content));
        }

        let spec = JobSpec::new(key.as_str(), name, kind, content.as_str());
        let job_id = spec.job_id;
        match self.dispatcher.dispatch(spec) {
            Ok(()) => info!(key = %key, job_id = %job_id, "Compression job dispatched"),
            Err(e) => {
                error!(key = %key, error = %e, "Dispatch failed");
                let failed = CachedAsset::failed(content.as_str(), e.to_string());
                if let Err(e) = self
                    .cache
                    .set(&key, &failed, self.config.pending_ttl())
                    .await
                {
                    warn!(key = %key, error = %e, "Failure record write failed");
                }
            }
        }

        Ok(Served::Original(content))
    }

    /// Compress the concatenated files of a payload.
    pub async fn compress_payload(&self, payload: &Payload) -> Result<Served> {
        let content = payload.dump().await?;
        if self.config.disabled {
            return Ok(Served::Original(content));
        }
        self.compress(CompressRequest::for_payload(
            payload,
            content,
            &self.config.key_format,
        ))
        .await
    }

    /// Concatenate a payload's files without compression.
    ///
    /// The concatenation is cached under the success TTL on first request;
    /// there is no placeholder phase.
    pub async fn append(&self, payload: &Payload) -> Result<Served> {
        if self.config.disabled {
            return Ok(Served::Original(payload.dump().await?));
        }

        let key = self.append_key(payload);
        match self.cache.get(&key).await {
            Ok(Some(cached)) => return Ok(Served::Cached(cached)),
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "Cache read failed, rebuilding append"),
        }

        let record = CachedAsset::appended(payload.dump().await?);
        if let Err(e) = self
            .cache
            .set(&key, &record, self.config.success_ttl())
            .await
        {
            warn!(key = %key, error = %e, "Append record write failed");
        }
        debug!(key = %key, files = payload.files().len(), "Appended group");
        Ok(Served::Cached(record))
    }

    /// Cache key of the compressed record for a payload.
    pub fn compress_key(&self, payload: &Payload) -> String {
        group_key(&self.config.key_format, payload.group(), payload.signature())
    }

    /// Cache key of the append record for a payload.
    pub fn append_key(&self, payload: &Payload) -> String {
        format!("{}{}", self.compress_key(payload), APPEND_KEY_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionStrategy;
    use assetpress_cache::MemoryCache;
    use assetpress_core::{AssetState, Error};
    use assetpress_fingerprint::FingerprintCodec;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Records dispatched jobs without running them.
    #[derive(Default)]
    struct Recording(Mutex<Vec<JobSpec>>);

    impl Dispatcher for Recording {
        fn dispatch(&self, spec: JobSpec) -> Result<()> {
            self.0.lock().unwrap().push(spec);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    struct Refusing;

    impl Dispatcher for Refusing {
        fn dispatch(&self, _spec: JobSpec) -> Result<()> {
            Err(Error::Dispatch("no workers".to_string()))
        }

        fn name(&self) -> &'static str {
            "refusing"
        }
    }

    fn coordinator(config: EngineConfig) -> (Coordinator, Arc<MemoryCache>, Arc<Recording>) {
        let cache = Arc::new(MemoryCache::new());
        let dispatcher = Arc::new(Recording::default());
        let coordinator = Coordinator::new(cache.clone(), dispatcher.clone(), config).unwrap();
        (coordinator, cache, dispatcher)
    }

    fn payload() -> (TempDir, Payload) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("js")).unwrap();
        std::fs::write(dir.path().join("js/a.js"), "var a = 1;").unwrap();
        std::fs::write(dir.path().join("js/b.js"), "var b = 2;").unwrap();
        let codec = FingerprintCodec::new("abc123", dir.path()).unwrap();
        let payload = codec
            .encode(AssetKind::Js, &["js/a.js", "js/b.js"], "agroup")
            .unwrap();
        (dir, payload)
    }

    #[tokio::test]
    async fn test_empty_content_is_passthrough() {
        let (coordinator, cache, dispatcher) = coordinator(EngineConfig::default());

        let served = coordinator
            .compress(CompressRequest::inline(AssetKind::Js, ""))
            .await
            .unwrap();
        assert_eq!(served, Served::Original(String::new()));
        assert!(cache.is_empty().await);
        assert!(dispatcher.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_miss_then_placeholder() {
        let (coordinator, cache, dispatcher) = coordinator(EngineConfig::default());
        let request = CompressRequest::inline(AssetKind::Js, "var a = 1;");
        let key = request.key.clone().unwrap();

        let first = coordinator.compress(request.clone()).await.unwrap();
        assert_eq!(first, Served::Original("var a = 1;".to_string()));

        let second = coordinator.compress(request).await.unwrap();
        assert_eq!(second.state(), AssetState::Processing);
        assert!(second.text().contains("Processing JS compression"));
        assert!(second.text().ends_with("var a = 1;"));

        assert!(cache.get(&key).await.unwrap().is_some());
        let jobs = dispatcher.0.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].key, key);
    }

    #[tokio::test]
    async fn test_hit_returns_record_verbatim() {
        let (coordinator, cache, dispatcher) = coordinator(EngineConfig::default());
        let request = CompressRequest::inline(AssetKind::Css, "a { color: red; }");
        let ready = CachedAsset::ready("inline", "a{color:red}");
        cache
            .set(request.key.as_deref().unwrap(), &ready, Duration::from_secs(60))
            .await
            .unwrap();

        let served = coordinator.compress(request).await.unwrap();
        assert_eq!(served, Served::Cached(ready));
        assert!(served.is_final());
        assert!(dispatcher.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_skips_cache() {
        let config = EngineConfig {
            disabled: true,
            ..Default::default()
        };
        let (coordinator, cache, dispatcher) = coordinator(config);

        let served = coordinator
            .compress(CompressRequest::inline(AssetKind::Js, "var a;"))
            .await
            .unwrap();
        assert_eq!(served.state(), AssetState::Original);
        assert!(cache.is_empty().await);
        assert!(dispatcher.0.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_placeholder_expires_and_redispatches() {
        let (coordinator, _cache, dispatcher) = coordinator(EngineConfig::default());
        let request = CompressRequest::inline(AssetKind::Js, "var c;");

        coordinator.compress(request.clone()).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        let served = coordinator.compress(request).await.unwrap();

        assert_eq!(served.state(), AssetState::Original);
        assert_eq!(dispatcher.0.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_failure_records_failure() {
        let cache = Arc::new(MemoryCache::new());
        let coordinator =
            Coordinator::new(cache.clone(), Arc::new(Refusing), EngineConfig::default()).unwrap();
        let request = CompressRequest::inline(AssetKind::Js, "var d;");
        let key = request.key.clone().unwrap();

        let served = coordinator.compress(request).await.unwrap();
        assert_eq!(served, Served::Original("var d;".to_string()));
        let record = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(record.state(), AssetState::Failed);
    }

    #[tokio::test]
    async fn test_payload_uses_group_key() {
        let (coordinator, _cache, dispatcher) = coordinator(EngineConfig::default());
        let (_dir, payload) = payload();

        let served = coordinator.compress_payload(&payload).await.unwrap();
        assert_eq!(served.text(), "var a = 1;\nvar b = 2;\n");

        let jobs = dispatcher.0.lock().unwrap();
        assert_eq!(jobs[0].key, format!("assetpress_agroup_{}", payload.signature()));
        assert_eq!(jobs[0].name, "js/a.js, js/b.js");
    }

    #[tokio::test]
    async fn test_append_caches_without_placeholder() {
        let (coordinator, cache, dispatcher) = coordinator(EngineConfig::default());
        let (dir, payload) = payload();

        let first = coordinator.append(&payload).await.unwrap();
        assert_eq!(first.state(), AssetState::Appended);
        assert_eq!(first.text(), "var a = 1;\nvar b = 2;\n");

        // Served from cache even after the source changes on disk.
        std::fs::write(dir.path().join("js/a.js"), "var a = 9;").unwrap();
        let second = coordinator.append(&payload).await.unwrap();
        assert_eq!(second.text(), "var a = 1;\nvar b = 2;\n");

        assert!(dispatcher.0.lock().unwrap().is_empty());
        assert!(cache.get(&coordinator.compress_key(&payload)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_disabled_reads_files() {
        let config = EngineConfig {
            disabled: true,
            ..Default::default()
        };
        let (coordinator, cache, _) = coordinator(config);
        let (_dir, payload) = payload();

        let served = coordinator.append(&payload).await.unwrap();
        assert_eq!(served, Served::Original("var a = 1;\nvar b = 2;\n".to_string()));
        assert!(cache.is_empty().await);
    }

    #[test]
    fn test_rejects_process_strategy_with_memory_cache() {
        let config = EngineConfig::default().with_strategy(ExecutionStrategy::Process);
        let result = Coordinator::new(
            Arc::new(MemoryCache::new()),
            Arc::new(Recording::default()),
            config,
        );
        assert!(result.is_err());
    }
}

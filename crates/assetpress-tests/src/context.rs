//! A full pipeline over a temporary content root.

use crate::fixtures::{RecordingCache, RecordingNotifier, UppercaseCompressor, write_content_root};
use assetpress_api::AppState;
use assetpress_cache::MemoryCache;
use assetpress_compress::Compressors;
use assetpress_core::ports::{Compressor, JobCache};
use assetpress_core::{AssetKind, Served};
use assetpress_engine::{
    Coordinator, EngineConfig, ExecutionStrategy, JobContext, create_dispatcher,
};
use assetpress_fingerprint::{FingerprintCodec, Payload};
use std::sync::Arc;

/// Secret shared by every test context.
pub const TEST_SECRET: &str = "abc123";

/// Wired-up pipeline. Dropping it removes the content root.
pub struct TestContext {
    pub content_root: tempfile::TempDir,
    pub codec: Arc<FingerprintCodec>,
    pub cache: Arc<RecordingCache>,
    pub notifier: Arc<RecordingNotifier>,
    pub coordinator: Arc<Coordinator>,
}

impl TestContext {
    pub fn builder() -> TestContextBuilder {
        TestContextBuilder::default()
    }

    /// Mint a payload over files already in the content root.
    pub fn payload(&self, kind: AssetKind, files: &[&str], group: &str) -> Payload {
        self.codec
            .encode(kind, files, group)
            .expect("Failed to encode test payload")
    }

    pub async fn compress(&self, payload: &Payload) -> Served {
        self.coordinator
            .compress_payload(payload)
            .await
            .expect("compress_payload failed")
    }

    pub fn app_state(&self) -> Arc<AppState> {
        Arc::new(AppState::new(self.codec.clone(), self.coordinator.clone()))
    }
}

/// Chooses the compressors and engine settings of a [`TestContext`].
pub struct TestContextBuilder {
    js: Arc<dyn Compressor>,
    css: Arc<dyn Compressor>,
    config: EngineConfig,
}

impl Default for TestContextBuilder {
    fn default() -> Self {
        Self {
            js: Arc::new(UppercaseCompressor::new()),
            css: Arc::new(UppercaseCompressor::new()),
            config: EngineConfig::default().with_strategy(ExecutionStrategy::Task),
        }
    }
}

impl TestContextBuilder {
    pub fn js(mut self, compressor: impl Compressor + 'static) -> Self {
        self.js = Arc::new(compressor);
        self
    }

    pub fn css(mut self, compressor: impl Compressor + 'static) -> Self {
        self.css = Arc::new(compressor);
        self
    }

    pub fn strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn config(mut self, f: impl FnOnce(&mut EngineConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn build(self) -> TestContext {
        let content_root = write_content_root();
        let codec = Arc::new(
            FingerprintCodec::new(TEST_SECRET, content_root.path()).expect("Failed to build codec"),
        );
        let cache = Arc::new(RecordingCache::new(Arc::new(MemoryCache::new())));
        let notifier = Arc::new(RecordingNotifier::default());

        let job_cache: Arc<dyn JobCache> = cache.clone();
        let context = Arc::new(JobContext::new(
            job_cache.clone(),
            Compressors::new(self.js, self.css),
            notifier.clone(),
            &self.config,
        ));
        let dispatcher =
            create_dispatcher(&self.config, context).expect("Failed to build dispatcher");
        let coordinator = Arc::new(
            Coordinator::new(job_cache, dispatcher, self.config).expect("Failed to build coordinator"),
        );

        TestContext {
            content_root,
            codec,
            cache,
            notifier,
            coordinator,
        }
    }
}

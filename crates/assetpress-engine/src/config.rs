//! Engine configuration.

use assetpress_cache::keys::DEFAULT_KEY_FORMAT;
use assetpress_core::ports::JobCache;
use assetpress_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where background compression jobs run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStrategy {
    /// A task on the caller's tokio runtime.
    Task,
    /// A dedicated OS thread with its own runtime.
    #[default]
    Thread,
    /// A separate `assetpress job` worker process. Needs a shared cache.
    Process,
}

impl ExecutionStrategy {
    /// Whether the job shares memory with the caller.
    pub fn shares_memory(&self) -> bool {
        !matches!(self, ExecutionStrategy::Process)
    }
}

/// Coordinator and job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// TTL of `Ready` and `Appended` records.
    #[serde(default = "default_success_ttl")]
    pub success_ttl_secs: u64,
    /// TTL of `Processing` placeholders and `Failed` records.
    #[serde(default = "default_pending_ttl")]
    pub pending_ttl_secs: u64,
    /// Key layout for file groups; `{group}` and `{hash}` are substituted.
    #[serde(default = "default_key_format")]
    pub key_format: String,
    #[serde(default)]
    pub strategy: ExecutionStrategy,
    /// Worker binary for the process strategy. Defaults to the running
    /// executable.
    #[serde(default)]
    pub worker_program: Option<PathBuf>,
    /// Job failures propagate instead of being reported to operators.
    #[serde(default)]
    pub debug: bool,
    /// Kill switch: serve uncompressed text and skip the cache.
    #[serde(default)]
    pub disabled: bool,
}

fn default_success_ttl() -> u64 {
    31_536_000
}

fn default_pending_ttl() -> u64 {
    60
}

fn default_key_format() -> String {
    DEFAULT_KEY_FORMAT.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            success_ttl_secs: default_success_ttl(),
            pending_ttl_secs: default_pending_ttl(),
            key_format: default_key_format(),
            strategy: ExecutionStrategy::default(),
            worker_program: None,
            debug: false,
            disabled: false,
        }
    }
}

impl EngineConfig {
    pub fn success_ttl(&self) -> Duration {
        Duration::from_secs(self.success_ttl_secs)
    }

    pub fn pending_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_ttl_secs)
    }

    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Reject settings that would make job results invisible or
    /// unreachable.
    pub fn validate(&self, cache: &dyn JobCache) -> Result<()> {
        if !self.strategy.shares_memory() && !cache.is_shared() {
            return Err(Error::Config(format!(
                "execution strategy 'process' needs a cache shared between processes, got '{}'",
                cache.name()
            )));
        }
        if self.pending_ttl_secs == 0 {
            return Err(Error::Config("pending_ttl_secs must be positive".to_string()));
        }
        if !self.key_format.contains("{hash}") {
            return Err(Error::Config(format!(
                "key_format '{}' must contain {{hash}}",
                self.key_format
            )));
        }
        Ok(())
    }
}

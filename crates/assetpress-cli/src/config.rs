//! Layered application configuration.
//!
//! Sources, later ones winning: built-in defaults, the YAML file, then
//! `ASSETPRESS__SECTION__FIELD` environment variables.

use ::config::{Config, ConfigError, Environment, File, FileFormat};
use assetpress_api::ServerConfig;
use assetpress_cache::CacheConfig;
use assetpress_compress::CompressorConfig;
use assetpress_engine::EngineConfig;
use assetpress_fingerprint::FingerprintConfig;
use assetpress_notify::NotifyConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::telemetry::LogConfig;

pub const DEFAULT_CONFIG_FILE: &str = "assetpress.yaml";
pub const ENV_PREFIX: &str = "ASSETPRESS";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fingerprint: FingerprintConfig,
    pub cache: CacheConfig,
    pub compressor: CompressorConfig,
    pub notify: NotifyConfig,
    pub engine: EngineConfig,
    pub server: ServerConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// Load from `path` (must exist) or from `assetpress.yaml` if present,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).format(FileFormat::Yaml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Copy safe to print: the signing secret is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.fingerprint.secret_key.is_empty() {
            copy.fingerprint.secret_key = "********".to_string();
        }
        copy
    }
}

//! Fingerprint configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for minting and verifying tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// HMAC key. Rotating it invalidates every URL issued so far.
    pub secret_key: String,
    /// Directory all asset paths are relative to.
    pub content_root: PathBuf,
    /// Public URL prefix of `content_root`, used when groups are expanded.
    pub content_url: String,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            content_root: PathBuf::from("./static"),
            content_url: "/static/".to_string(),
        }
    }
}

impl FingerprintConfig {
    pub fn new(secret_key: impl Into<String>, content_root: impl Into<PathBuf>) -> Self {
        Self {
            secret_key: secret_key.into(),
            content_root: content_root.into(),
            ..Default::default()
        }
    }

    pub fn with_content_url(mut self, url: impl Into<String>) -> Self {
        self.content_url = url.into();
        self
    }
}

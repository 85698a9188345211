//! HTTP server configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Path prefix the asset routes are mounted under, as seen by clients.
    #[serde(default)]
    pub mount: String,
    /// Render direct links to every file instead of group URLs.
    #[serde(default)]
    pub expand: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            mount: String::new(),
            expand: false,
        }
    }
}

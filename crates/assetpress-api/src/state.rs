//! Application state shared across handlers.

use assetpress_engine::Coordinator;
use assetpress_fingerprint::FingerprintCodec;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub codec: Arc<FingerprintCodec>,
    pub coordinator: Arc<Coordinator>,
}

impl AppState {
    pub fn new(codec: Arc<FingerprintCodec>, coordinator: Arc<Coordinator>) -> Self {
        Self { codec, coordinator }
    }

    /// Debug mode shows error details to clients.
    pub fn debug(&self) -> bool {
        self.coordinator.config().debug
    }
}

//! HTTP surface and template helpers for assetpress.
//!
//! Serves compressed and appended file groups at
//! `/{j|c}/{group}/{token}/{c|a}/{signature}.{js|css}`, renders the tags
//! that point at those URLs, and compresses inline script blocks.

pub mod config;
pub mod error;
pub mod handlers;
pub mod inline;
pub mod middleware;
pub mod render;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use inline::{compress_inline_scripts, extract_script_text};
pub use render::{Action, AssetGroups, GroupEntry, TagRenderer};
pub use routes::create_router;
pub use state::AppState;

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Bind `config.bind` and serve until the process is stopped.
pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = TcpListener::bind(&config.bind).await?;
    info!(addr = %listener.local_addr()?, "assetpress listening");
    axum::serve(listener, create_router(state)).await
}

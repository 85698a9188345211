//! Route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{assets, health, inline};
use crate::middleware::request_id;
use crate::state::AppState;

/// Create the router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(asset_routes())
        .route("/inline", post(inline::compress_inline))
        .route("/health", get(health::health))
        .layer(middleware::from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn asset_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/j/{group}/{token}/c/{file}", get(assets::compress_js))
        .route("/j/{group}/{token}/a/{file}", get(assets::append_js))
        .route("/c/{group}/{token}/c/{file}", get(assets::compress_css))
        .route("/c/{group}/{token}/a/{file}", get(assets::append_css))
}

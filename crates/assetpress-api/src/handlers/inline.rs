//! Inline script block handler.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::inline::compress_inline_scripts;
use crate::state::AppState;

/// Compress the `<script>` blocks of an HTML fragment posted as the body.
pub async fn compress_inline(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Response, ApiError> {
    let html = compress_inline_scripts(&state.coordinator, &body)
        .await
        .map_err(|e| ApiError::new(e, state.debug()))?;
    Ok(([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html).into_response())
}

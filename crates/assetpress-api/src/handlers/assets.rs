//! Asset group handlers.

use assetpress_core::{AssetKind, Error, Result, Served};
use assetpress_fingerprint::is_valid_group;
use axum::{
    extract::{Path, State},
    http::{HeaderName, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, warn};

use crate::error::ApiError;
use crate::render::Action;
use crate::state::AppState;

pub const ASSET_STATE_HEADER: &str = "x-asset-state";

#[derive(Debug, Deserialize)]
pub struct AssetPath {
    pub group: String,
    pub token: String,
    /// `<signature>.<ext>`
    pub file: String,
}

pub async fn compress_js(
    State(state): State<Arc<AppState>>,
    Path(path): Path<AssetPath>,
) -> std::result::Result<Response, ApiError> {
    serve(&state, AssetKind::Js, Action::Compress, path).await
}

pub async fn append_js(
    State(state): State<Arc<AppState>>,
    Path(path): Path<AssetPath>,
) -> std::result::Result<Response, ApiError> {
    serve(&state, AssetKind::Js, Action::Append, path).await
}

pub async fn compress_css(
    State(state): State<Arc<AppState>>,
    Path(path): Path<AssetPath>,
) -> std::result::Result<Response, ApiError> {
    serve(&state, AssetKind::Css, Action::Compress, path).await
}

pub async fn append_css(
    State(state): State<Arc<AppState>>,
    Path(path): Path<AssetPath>,
) -> std::result::Result<Response, ApiError> {
    serve(&state, AssetKind::Css, Action::Append, path).await
}

async fn serve(
    state: &AppState,
    kind: AssetKind,
    action: Action,
    path: AssetPath,
) -> std::result::Result<Response, ApiError> {
    match load(state, kind, action, &path).await {
        Ok(served) => Ok(asset_response(kind, served)),
        Err(e) => {
            if e.is_client_fault() {
                warn!(group = %path.group, error = %e, "Rejected asset request");
            } else {
                error!(group = %path.group, error = %e, "Asset request failed");
            }
            Err(ApiError::new(e, state.debug()))
        }
    }
}

async fn load(state: &AppState, kind: AssetKind, action: Action, path: &AssetPath) -> Result<Served> {
    if !is_valid_group(&path.group) {
        return Err(Error::Payload(format!("Invalid Group: {}", path.group)));
    }
    let signature = path
        .file
        .strip_suffix(kind.extension())
        .ok_or_else(|| Error::Payload(format!("Invalid File Type: {}", path.file)))?;

    let payload = state
        .codec
        .decode(kind, &path.group, &path.token, signature)?;

    match action {
        Action::Compress => state.coordinator.compress_payload(&payload).await,
        Action::Append => state.coordinator.append(&payload).await,
    }
}

fn asset_response(kind: AssetKind, served: Served) -> Response {
    let asset_state = served.state().as_str();
    (
        [
            (header::CONTENT_TYPE, kind.content_type()),
            (HeaderName::from_static(ASSET_STATE_HEADER), asset_state),
        ],
        served.into_text(),
    )
        .into_response()
}

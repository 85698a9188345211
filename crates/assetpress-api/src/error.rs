//! Mapping of core errors to HTTP responses.

use assetpress_core::Error;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

/// An error answered as a JavaScript/CSS comment so that a broken asset URL
/// never breaks the page parsing it.
#[derive(Debug)]
pub struct ApiError {
    error: Error,
    debug: bool,
}

impl ApiError {
    pub fn new(error: Error, debug: bool) -> Self {
        Self { error, debug }
    }

    pub fn status(&self) -> StatusCode {
        if self.error.is_client_fault() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn body(&self) -> String {
        if self.debug {
            format!("/* {} */", self.error)
        } else if self.error.is_client_fault() {
            "/* Invalid Request */".to_string()
        } else {
            "/* Internal Error */".to_string()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.body(),
        )
            .into_response()
    }
}

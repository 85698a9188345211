//! Closure Compiler web service backend.

use assetpress_core::ports::Compressor;
use assetpress_core::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_CLOSURE_URL: &str = "https://closure-compiler.appspot.com/compile";
pub const DEFAULT_COMPILATION_LEVEL: &str = "SIMPLE_OPTIMIZATIONS";

/// Posts the source as a form to the Closure Compiler service and returns
/// the compiled code. Any non-200 answer is a compression failure.
pub struct ClosureWebCompressor {
    url: String,
    compilation_level: String,
    debug: bool,
    client: reqwest::Client,
}

impl ClosureWebCompressor {
    pub fn new(url: impl Into<String>, compilation_level: impl Into<String>, debug: bool) -> Self {
        Self {
            url: url.into(),
            compilation_level: compilation_level.into(),
            debug,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        self
    }

    fn form<'a>(&'a self, source: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![
            ("js_code", source),
            ("compilation_level", self.compilation_level.as_str()),
            ("output_format", "text"),
            ("output_info", "compiled_code"),
        ];
        if self.debug {
            params.push(("formatting", "pretty_print"));
        }
        params
    }
}

impl Default for ClosureWebCompressor {
    fn default() -> Self {
        Self::new(DEFAULT_CLOSURE_URL, DEFAULT_COMPILATION_LEVEL, false)
    }
}

#[async_trait]
impl Compressor for ClosureWebCompressor {
    async fn compress(&self, source: &str) -> Result<String> {
        debug!(url = %self.url, bytes = source.len(), "Posting to Closure Compiler");

        let response = self
            .client
            .post(&self.url)
            .form(&self.form(source))
            .send()
            .await
            .map_err(|e| Error::Compression(format!("Closure request failed: {}", e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::Compression(format!(
                "Invalid Closure Request Status Code {}",
                status.as_u16()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::Compression(format!("Closure response unreadable: {}", e)))
    }

    fn name(&self) -> &str {
        "closure_web"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_closure_web_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/compile"))
            .and(body_string_contains("output_info=compiled_code"))
            .and(body_string_contains("compilation_level=SIMPLE_OPTIMIZATIONS"))
            .respond_with(ResponseTemplate::new(200).set_body_string("var a=1;"))
            .expect(1)
            .mount(&server)
            .await;

        let c = ClosureWebCompressor::new(
            format!("{}/compile", server.uri()),
            DEFAULT_COMPILATION_LEVEL,
            false,
        );
        assert_eq!(c.compress("var a = 1;").await.unwrap(), "var a=1;");
    }

    #[tokio::test]
    async fn test_closure_web_debug_pretty_prints() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("formatting=pretty_print"))
            .respond_with(ResponseTemplate::new(200).set_body_string("var a = 1;\n"))
            .expect(1)
            .mount(&server)
            .await;

        let c = ClosureWebCompressor::new(server.uri(), DEFAULT_COMPILATION_LEVEL, true);
        c.compress("var a=1").await.unwrap();
    }

    #[tokio::test]
    async fn test_closure_web_non_200() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let c = ClosureWebCompressor::new(server.uri(), DEFAULT_COMPILATION_LEVEL, false);
        let err = c.compress("var a").await.unwrap_err();
        assert!(matches!(err, Error::Compression(ref m) if m.contains("503")));
    }
}

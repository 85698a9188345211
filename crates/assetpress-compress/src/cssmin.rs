//! In-process CSS minifier backed by lightningcss.

use assetpress_core::ports::Compressor;
use assetpress_core::{Error, Result};
use async_trait::async_trait;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use tracing::debug;

pub const DEFAULT_MAX_LINE_LEN: usize = 8192;

/// Minifies stylesheets without leaving the process.
///
/// Output lines are broken after a closing brace once they pass
/// `max_line_len` bytes; zero disables wrapping. With `debug` set the
/// stylesheet is re-printed without minification.
#[derive(Debug, Clone)]
pub struct CssminCompressor {
    max_line_len: usize,
    debug: bool,
}

impl CssminCompressor {
    pub fn new(max_line_len: usize, debug: bool) -> Self {
        Self {
            max_line_len,
            debug,
        }
    }

    fn minify(&self, source: &str) -> Result<String> {
        let mut sheet = StyleSheet::parse(source, ParserOptions::default())
            .map_err(|e| Error::Compression(format!("CSS parse error: {}", e)))?;

        if !self.debug {
            sheet
                .minify(MinifyOptions::default())
                .map_err(|e| Error::Compression(format!("CSS minify error: {}", e)))?;
        }

        let printed = sheet
            .to_css(PrinterOptions {
                minify: !self.debug,
                ..PrinterOptions::default()
            })
            .map_err(|e| Error::Compression(format!("CSS print error: {}", e)))?;

        Ok(wrap_lines(&printed.code, self.max_line_len))
    }
}

impl Default for CssminCompressor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LEN, false)
    }
}

/// Insert a newline after the first `}` past every `max` bytes of a line.
fn wrap_lines(css: &str, max: usize) -> String {
    if max == 0 {
        return css.to_string();
    }
    let mut out = String::with_capacity(css.len() + css.len() / max);
    let mut line_len = 0;
    for c in css.chars() {
        out.push(c);
        line_len = if c == '\n' { 0 } else { line_len + c.len_utf8() };
        if c == '}' && line_len > max {
            out.push('\n');
            line_len = 0;
        }
    }
    out
}

#[async_trait]
impl Compressor for CssminCompressor {
    async fn compress(&self, source: &str) -> Result<String> {
        debug!(bytes = source.len(), "Minifying stylesheet");
        let this = self.clone();
        let source = source.to_owned();
        tokio::task::spawn_blocking(move || this.minify(&source))
            .await
            .map_err(|e| Error::Compression(format!("CSS minifier task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        "cssmin"
    }
}

//! A validated, ordered group of asset files.

use assetpress_core::{AssetKind, Result};
use std::path::PathBuf;

/// Files named by a token, already checked against the content root.
///
/// Only [`FingerprintCodec`](crate::FingerprintCodec) constructs payloads, so
/// holding one means every file passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub(crate) kind: AssetKind,
    pub(crate) group: String,
    pub(crate) files: Vec<String>,
    pub(crate) sources: Vec<PathBuf>,
    pub(crate) mod_time: i64,
    pub(crate) token: String,
    pub(crate) signature: String,
}

impl Payload {
    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Relative file names in concatenation order.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Latest modification time across the files, epoch seconds.
    pub fn mod_time(&self) -> i64 {
        self.mod_time
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Human-readable job name: the file list.
    pub fn name(&self) -> String {
        self.files.join(", ")
    }

    /// Request path for this payload, `append` selecting the `a` action.
    pub fn path(&self, append: bool) -> String {
        format!(
            "/{}/{}/{}/{}/{}{}",
            self.kind.url_prefix(),
            self.group,
            self.token,
            if append { "a" } else { "c" },
            self.signature,
            self.kind.extension()
        )
    }

    /// Concatenate the files in order, each followed by a newline.
    pub async fn dump(&self) -> Result<String> {
        let mut buf = String::new();
        for source in &self.sources {
            let contents = tokio::fs::read_to_string(source).await?;
            buf.push_str(&contents);
            buf.push('\n');
        }
        Ok(buf)
    }
}

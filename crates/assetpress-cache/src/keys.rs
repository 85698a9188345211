//! Cache key generation utilities.

use sha2::{Digest, Sha256};

/// Prefix for keys derived from inline content.
pub const CODE_KEY_PREFIX: &str = "assetpress_code";

/// Default layout for file-group keys. Front-end servers reading the cache
/// directly rely on it, so it is configurable.
pub const DEFAULT_KEY_FORMAT: &str = "assetpress_{group}_{hash}";

/// Short hex digest of content, used as inline job name.
pub fn content_hash(content: &str) -> String {
    let hash = Sha256::digest(content.as_bytes());
    hex::encode(&hash[..16])
}

/// Key for an inline block of source text.
pub fn content_key(content: &str) -> String {
    format!("{}_{}", CODE_KEY_PREFIX, content_hash(content))
}

/// Key for a file group, filling `{group}` and `{hash}` in `format`.
pub fn group_key(format: &str, group: &str, hash: &str) -> String {
    format.replace("{group}", group).replace("{hash}", hash)
}

/// Sanitize a key for use in filenames.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '.' => '_',
            _ => c,
        })
        .collect()
}

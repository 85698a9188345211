//! Job cache backends for assetpress.
//!
//! The job cache is both the result store and the in-flight marker for
//! background compression jobs. `MemoryCache` is shared between threads of
//! one process; `FilesystemCache` is shared between processes on one host.

pub mod compression;
pub mod keys;
pub mod provider;
pub mod types;

pub use compression::{compress, decompress};
pub use keys::{content_hash, content_key, group_key, sanitize_key};
pub use provider::{FilesystemCache, MemoryCache, build_cache};
pub use types::{CacheBackend, CacheConfig, CacheRecord, CacheStats, CompressionType};

//! assetpress core
//!
//! Core domain types, traits, and error handling for assetpress.
//! This crate has minimal dependencies and defines the shared vocabulary
//! used across all other crates: asset kinds, the cached job record, and
//! the ports the engine talks through (cache, compressor, notifier).

pub mod asset;
pub mod error;
pub mod ids;
pub mod ports;

pub use asset::{AssetKind, AssetState, CachedAsset, Served};
pub use error::{Error, Result};
pub use ids::JobId;

//! Integration test infrastructure for assetpress.
//!
//! Builds a complete pipeline (codec, cache, dispatcher, coordinator) over
//! a temporary content root, with in-process compressors standing in for
//! the external tools.
//!
//! # Usage
//!
//! ```ignore
//! use assetpress_tests::TestContext;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let ctx = TestContext::builder().build();
//!     // Use ctx.codec, ctx.coordinator, ctx.cache, etc.
//! }
//! ```

pub mod context;
pub mod fixtures;
pub mod helpers;

pub use context::{TestContext, TestContextBuilder};
pub use fixtures::*;
pub use helpers::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,assetpress_engine=debug")),
        )
        .with_test_writer()
        .try_init();
}

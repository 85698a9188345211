//! Compressor backends for assetpress.
//!
//! Every backend implements [`assetpress_core::ports::Compressor`]:
//! source text in, compressed text out, `Error::Compression` on failure.
//! External tools are driven over stdin/stdout; the Closure Compiler web
//! service is driven over HTTP. Stylesheets are minified in process.

pub mod closure_web;
pub mod command;
pub mod config;
pub mod cssmin;

pub use closure_web::ClosureWebCompressor;
pub use command::CommandCompressor;
pub use cssmin::CssminCompressor;
pub use config::{BackendConfig, CompressorConfig, Compressors, create_compressor};

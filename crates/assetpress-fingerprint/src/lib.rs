//! Fingerprint tokens for groups of asset files.
//!
//! A group of files is named in URLs by three parts: the group label, a
//! URL-safe base64 token carrying `file1,file2,...,modTime`, and a hex
//! HMAC-SHA256 signature binding all of them to the server secret.

pub mod codec;
pub mod config;
pub mod payload;
pub mod validate;

pub use codec::{FingerprintCodec, Signer, url_decode, url_encode};
pub use config::FingerprintConfig;
pub use payload::Payload;
pub use validate::{check_file_name, is_valid_group};

//! Token encoding and signature verification.

use crate::config::FingerprintConfig;
use crate::payload::Payload;
use crate::validate::{check_file_name, is_valid_group};
use assetpress_core::{AssetKind, Error, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Length of a hex-encoded HMAC-SHA256 digest.
const SIGNATURE_HEX_LEN: usize = 64;

/// Keyed-hash signer for token parts.
#[derive(Clone)]
pub struct Signer {
    secret: Vec<u8>,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

impl Signer {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(Error::Config("secret key must not be empty".into()));
        }
        Ok(Self { secret })
    }

    fn mac<S: AsRef<str>>(&self, files: &[S], group: &str, mod_time: &str, extra: &[&str]) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::Internal(format!("HMAC init failed: {}", e)))?;
        for file in files {
            mac.update(file.as_ref().as_bytes());
        }
        mac.update(group.as_bytes());
        mac.update(mod_time.as_bytes());
        for part in extra {
            mac.update(part.as_bytes());
        }
        Ok(mac)
    }

    /// Hex digest over the files in order, then group, mod time and any
    /// extra parts.
    pub fn sign<S: AsRef<str>>(
        &self,
        files: &[S],
        group: &str,
        mod_time: &str,
        extra: &[&str],
    ) -> Result<String> {
        let mac = self.mac(files, group, mod_time, extra)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Constant-time check of a supplied signature over the same parts
    /// [`Signer::sign`] takes.
    ///
    /// Only the canonical lowercase form produced by [`Signer::sign`] is
    /// accepted.
    pub fn verify<S: AsRef<str>>(
        &self,
        files: &[S],
        group: &str,
        mod_time: &str,
        extra: &[&str],
        signature: &str,
    ) -> Result<bool> {
        let canonical = signature.len() == SIGNATURE_HEX_LEN
            && signature
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !canonical {
            return Ok(false);
        }
        let Ok(expected) = hex::decode(signature) else {
            return Ok(false);
        };
        let mac = self.mac(files, group, mod_time, extra)?;
        Ok(mac.verify_slice(&expected).is_ok())
    }
}

/// URL-safe base64 of the comma-joined files and trailing parts.
pub fn url_encode<S: AsRef<str>>(files: &[S], parts: &[&str]) -> String {
    let joined = files
        .iter()
        .map(|f| f.as_ref())
        .chain(parts.iter().copied())
        .collect::<Vec<_>>()
        .join(",");
    URL_SAFE.encode(joined)
}

/// Reverse of [`url_encode`]: the comma-separated parts.
pub fn url_decode(token: &str) -> Result<Vec<String>> {
    let bytes = URL_SAFE
        .decode(token)
        .map_err(|_| Error::Payload("Invalid encoding".into()))?;
    let text = String::from_utf8(bytes).map_err(|_| Error::Payload("Invalid encoding".into()))?;
    Ok(text.split(',').map(str::to_string).collect())
}

/// Mints and verifies fingerprint tokens for one content root and secret.
#[derive(Debug, Clone)]
pub struct FingerprintCodec {
    signer: Signer,
    content_root: PathBuf,
}

impl FingerprintCodec {
    pub fn new(secret: impl Into<Vec<u8>>, content_root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            signer: Signer::new(secret)?,
            content_root: content_root.into(),
        })
    }

    pub fn from_config(config: &FingerprintConfig) -> Result<Self> {
        Self::new(config.secret_key.as_bytes(), config.content_root.clone())
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// Validate every file and return their resolved paths, in order.
    pub fn check<S: AsRef<str>>(&self, kind: AssetKind, files: &[S]) -> Result<Vec<PathBuf>> {
        files
            .iter()
            .map(|f| check_file_name(&self.content_root, kind, f.as_ref()))
            .collect()
    }

    /// Build a payload from a trusted, in-memory file list.
    ///
    /// Not idempotent across time: touching a source file changes the mod
    /// time and therefore both the token and the signature.
    pub fn encode<S: AsRef<str>>(&self, kind: AssetKind, files: &[S], group: &str) -> Result<Payload> {
        if files.is_empty() {
            return Err(Error::Payload("No Files Provided".into()));
        }
        if !is_valid_group(group) {
            return Err(Error::Payload(format!("Invalid group name: {}", group)));
        }

        let sources = self.check(kind, files)?;
        let mod_time = latest_mod_time(&sources)?;
        let mod_time_str = mod_time.to_string();

        let signature = self.signer.sign(files, group, &mod_time_str, &[])?;
        let token = url_encode(files, &[mod_time_str.as_str()]);

        debug!(group = %group, files = files.len(), mod_time, "Encoded payload");

        Ok(Payload {
            kind,
            group: group.to_string(),
            files: files.iter().map(|f| f.as_ref().to_string()).collect(),
            sources,
            mod_time,
            token,
            signature,
        })
    }

    /// Rebuild a payload from untrusted URL parts.
    ///
    /// The token is authenticated before any file is touched; the canonical
    /// encoding check only runs once the signature matched.
    ///
    /// The base64 engine already refuses non-canonical input (missing
    /// padding, trailing bits), so such tokens fail as `Invalid encoding`
    /// before the signature is checked. The re-encoding comparison stays as
    /// a second check that the signed parts map back to exactly this token.
    pub fn decode(&self, kind: AssetKind, group: &str, token: &str, signature: &str) -> Result<Payload> {
        if token.is_empty() {
            return Err(Error::Payload("Payload empty".into()));
        }

        let mut parts = url_decode(token)?;
        if parts.len() < 2 {
            return Err(Error::Payload(format!(
                "Invalid Payload Length {}",
                parts.len()
            )));
        }

        let mod_time_str = parts.pop().unwrap_or_default();
        let files = parts;

        if !self.signer.verify(&files, group, &mod_time_str, &[], signature)? {
            warn!(group = %group, "Rejected payload with invalid signature");
            return Err(Error::Payload("Invalid Signature".into()));
        }

        if url_encode(&files, &[mod_time_str.as_str()]) != token {
            return Err(Error::Payload("Invalid Encoding".into()));
        }

        if files.is_empty() {
            return Err(Error::Payload("No Files Provided".into()));
        }

        let mod_time = mod_time_str
            .parse::<i64>()
            .map_err(|_| Error::Payload(format!("Invalid timestamp: {}", mod_time_str)))?;

        let sources = self.check(kind, &files)?;

        Ok(Payload {
            kind,
            group: group.to_string(),
            files,
            sources,
            mod_time,
            token: token.to_string(),
            signature: signature.to_string(),
        })
    }
}

fn latest_mod_time(paths: &[PathBuf]) -> Result<i64> {
    let mut latest = 0i64;
    for path in paths {
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| Error::BadFile(format!("{}: {}", path.display(), e)))?;
        let secs = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        latest = latest.max(secs);
    }
    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "abc123";

    fn content_root(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            let path = dir.path().join(f);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, format!("// {}\n", f)).unwrap();
        }
        dir
    }

    fn codec(root: &tempfile::TempDir) -> FingerprintCodec {
        FingerprintCodec::new(SECRET, root.path()).unwrap()
    }

    #[test]
    fn test_signature_fixed_vector() {
        let signer = Signer::new(SECRET).unwrap();
        let sig = signer
            .sign(&["js/a.js", "js/b.js"], "agroup", "1296949725", &[])
            .unwrap();
        assert_eq!(
            sig,
            "fceba194a9faf706f8abe35ba5a10d746be0244e09681da0abcb5407e1ca44e9"
        );
    }

    #[test]
    fn test_url_encoding_fixed_vector() {
        let token = url_encode(&["js/a.js", "js/b.js"], &["1296949725"]);
        assert_eq!(token, "anMvYS5qcyxqcy9iLmpzLDEyOTY5NDk3MjU=");
        assert_eq!(
            url_decode(&token).unwrap(),
            vec!["js/a.js", "js/b.js", "1296949725"]
        );
    }

    #[test]
    fn test_verify_covers_extra_parts() {
        let signer = Signer::new(SECRET).unwrap();
        let files = ["js/a.js"];
        let sig = signer.sign(&files, "agroup", "1296949725", &["a"]).unwrap();

        assert!(signer.verify(&files, "agroup", "1296949725", &["a"], &sig).unwrap());
        assert!(!signer.verify(&files, "agroup", "1296949725", &[], &sig).unwrap());
        assert!(!signer.verify(&files, "agroup", "1296949725", &["c"], &sig).unwrap());
    }

    #[test]
    fn test_trailing_bits_rejected_before_signature() {
        // "YQ==" is canonical for "a"; "YR==" carries non-zero trailing bits.
        assert_eq!(url_decode("YQ==").unwrap(), vec!["a"]);
        let err = url_decode("YR==").unwrap_err();
        assert!(matches!(err, Error::Payload(ref m) if m == "Invalid encoding"));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(Signer::new(""), Err(Error::Config(_))));
    }

    #[test]
    fn test_roundtrip_preserves_order() {
        let root = content_root(&["js/a.js", "js/b.js", "js/c.js"]);
        let codec = codec(&root);
        let files = ["js/c.js", "js/a.js", "js/b.js"];

        let encoded = codec.encode(AssetKind::Js, &files, "main").unwrap();
        let decoded = codec
            .decode(AssetKind::Js, "main", encoded.token(), encoded.signature())
            .unwrap();

        assert_eq!(decoded.files(), &files);
        assert_eq!(decoded.mod_time(), encoded.mod_time());
        assert_eq!(decoded.name(), "js/c.js, js/a.js, js/b.js");
    }

    #[test]
    fn test_reordering_changes_signature() {
        let root = content_root(&["js/a.js", "js/b.js"]);
        let codec = codec(&root);

        let forward = codec.encode(AssetKind::Js, &["js/a.js", "js/b.js"], "main").unwrap();
        let reversed = codec.encode(AssetKind::Js, &["js/b.js", "js/a.js"], "main").unwrap();
        assert_ne!(forward.signature(), reversed.signature());

        let err = codec
            .decode(AssetKind::Js, "main", reversed.token(), forward.signature())
            .unwrap_err();
        assert!(matches!(err, Error::Payload(ref m) if m == "Invalid Signature"));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let root = content_root(&["js/a.js"]);
        let codec = codec(&root);
        let payload = codec.encode(AssetKind::Js, &["js/a.js"], "main").unwrap();

        let sig = payload.signature();
        for idx in [0, sig.len() / 2, sig.len() - 1] {
            let mut bytes = sig.as_bytes().to_vec();
            bytes[idx] = if bytes[idx] == b'0' { b'1' } else { b'0' };
            let tampered = String::from_utf8(bytes).unwrap();
            let err = codec
                .decode(AssetKind::Js, "main", payload.token(), &tampered)
                .unwrap_err();
            assert!(matches!(err, Error::Payload(ref m) if m == "Invalid Signature"));
        }

        let upper = sig.to_uppercase();
        if upper != sig {
            let err = codec
                .decode(AssetKind::Js, "main", payload.token(), &upper)
                .unwrap_err();
            assert!(matches!(err, Error::Payload(ref m) if m == "Invalid Signature"));
        }
    }

    #[test]
    fn test_group_is_bound() {
        let root = content_root(&["js/a.js"]);
        let codec = codec(&root);
        let payload = codec.encode(AssetKind::Js, &["js/a.js"], "main").unwrap();

        let err = codec
            .decode(AssetKind::Js, "other", payload.token(), payload.signature())
            .unwrap_err();
        assert!(matches!(err, Error::Payload(ref m) if m == "Invalid Signature"));
    }

    #[test]
    fn test_other_secret_rejected() {
        let root = content_root(&["js/a.js"]);
        let payload = codec(&root)
            .encode(AssetKind::Js, &["js/a.js"], "main")
            .unwrap();

        let other = FingerprintCodec::new("another-secret", root.path()).unwrap();
        let err = other
            .decode(AssetKind::Js, "main", payload.token(), payload.signature())
            .unwrap_err();
        assert!(matches!(err, Error::Payload(ref m) if m == "Invalid Signature"));
    }

    #[test]
    fn test_short_or_empty_token_rejected_before_fs() {
        // Root does not exist; reaching the filesystem would give BadFile.
        let codec = FingerprintCodec::new(SECRET, "/nonexistent/assetpress-root").unwrap();

        let err = codec.decode(AssetKind::Js, "main", "", "00").unwrap_err();
        assert!(matches!(err, Error::Payload(ref m) if m == "Payload empty"));

        let single = url_encode::<&str>(&[], &["1296949725"]);
        let err = codec.decode(AssetKind::Js, "main", &single, "00").unwrap_err();
        assert!(matches!(err, Error::Payload(ref m) if m == "Invalid Payload Length 1"));

        let err = codec.decode(AssetKind::Js, "main", "!!not base64!!", "00").unwrap_err();
        assert!(matches!(err, Error::Payload(ref m) if m == "Invalid encoding"));
    }

    #[test]
    fn test_non_canonical_token_rejected() {
        // "js/ab.js,<mod time>" is 19 bytes, so the canonical token is padded.
        let root = content_root(&["js/ab.js"]);
        let codec = codec(&root);
        let payload = codec.encode(AssetKind::Js, &["js/ab.js"], "main").unwrap();
        assert!(payload.token().ends_with('='));

        let unpadded = payload.token().trim_end_matches('=').to_string();
        let err = codec
            .decode(AssetKind::Js, "main", &unpadded, payload.signature())
            .unwrap_err();
        assert!(matches!(err, Error::Payload(ref m) if m == "Invalid encoding"));
    }

    #[test]
    fn test_signed_but_missing_file_is_bad_file() {
        let root = content_root(&["js/a.js"]);
        let codec = codec(&root);
        let payload = codec.encode(AssetKind::Js, &["js/a.js"], "main").unwrap();

        std::fs::remove_file(root.path().join("js/a.js")).unwrap();
        let err = codec
            .decode(AssetKind::Js, "main", payload.token(), payload.signature())
            .unwrap_err();
        assert!(matches!(err, Error::BadFile(_)));
    }

    #[test]
    fn test_encode_rejects_missing_files() {
        let root = content_root(&[]);
        let err = codec(&root)
            .encode(AssetKind::Js, &["js/a123.js", "js/bcccc.js", "js/foo/bar.js"], "base")
            .unwrap_err();
        assert!(matches!(err, Error::BadFile(_)));
    }

    #[test]
    fn test_encode_rejects_empty_list_and_bad_group() {
        let root = content_root(&["js/a.js"]);
        let codec = codec(&root);
        assert!(matches!(
            codec.encode::<&str>(AssetKind::Js, &[], "main"),
            Err(Error::Payload(_))
        ));
        assert!(matches!(
            codec.encode(AssetKind::Js, &["js/a.js"], "bad group"),
            Err(Error::Payload(_))
        ));
    }

    #[test]
    fn test_kind_is_enforced_on_decode() {
        let root = content_root(&["js/a.js"]);
        let codec = codec(&root);
        let payload = codec.encode(AssetKind::Js, &["js/a.js"], "main").unwrap();

        let err = codec
            .decode(AssetKind::Css, "main", payload.token(), payload.signature())
            .unwrap_err();
        assert!(matches!(err, Error::BadFile(ref m) if m.starts_with("Invalid File Type")));
    }

    #[test]
    fn test_payload_path() {
        let root = content_root(&["css/site.css"]);
        let payload = codec(&root)
            .encode(AssetKind::Css, &["css/site.css"], "site")
            .unwrap();
        let path = payload.path(false);
        assert!(path.starts_with("/c/site/"));
        assert!(path.ends_with(&format!("/c/{}.css", payload.signature())));
        assert!(payload.path(true).contains("/a/"));
    }

    #[tokio::test]
    async fn test_dump_concatenates_in_order() {
        let root = content_root(&["js/a.js", "js/b.js"]);
        let payload = codec(&root)
            .encode(AssetKind::Js, &["js/b.js", "js/a.js"], "main")
            .unwrap();

        let dump = payload.dump().await.unwrap();
        assert_eq!(dump, "// js/b.js\n\n// js/a.js\n\n");
    }
}

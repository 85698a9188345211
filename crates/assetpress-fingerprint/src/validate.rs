//! Allow-list checks applied to every file path before it is trusted.

use assetpress_core::{AssetKind, Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Traversal sequences, backslashes, whitespace, shell and URL
/// metacharacters, and the comma used as token separator.
static BAD_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\.\.|\./|\\|['%"$~+|<>&\s{}()@,`?])"#).expect("valid bad-file pattern")
});

static GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("valid group pattern"));

/// Group labels travel in the URL path and must be alphanumeric.
pub fn is_valid_group(group: &str) -> bool {
    GROUP_RE.is_match(group)
}

/// Check a relative file name and resolve it under `root`.
///
/// Rejects names that match the disallowed pattern, start with `.` or `/`,
/// lack the extension for `kind`, or do not exist as a file under `root`.
pub fn check_file_name(root: &Path, kind: AssetKind, name: &str) -> Result<PathBuf> {
    if name.is_empty() || BAD_FILE_RE.is_match(name) || name.starts_with(['.', '/']) {
        return Err(Error::BadFile(format!("Invalid File Name: {}", name)));
    }

    if !name.ends_with(kind.extension()) {
        return Err(Error::BadFile(format!("Invalid File Type: {}", name)));
    }

    let path = root.join(name);
    if !path.is_file() {
        return Err(Error::BadFile(format!(
            "File Does Not Exist: {}",
            path.display()
        )));
    }
    Ok(path)
}

//! Inline `<script>` block compression.

use assetpress_core::{AssetKind, Result};
use assetpress_engine::{CompressRequest, Coordinator};
use regex::Regex;
use std::sync::LazyLock;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>(.*?)</script\s*>").expect("valid script pattern")
});

/// Concatenated text of every `<script>` element in `html`.
pub fn extract_script_text(html: &str) -> String {
    SCRIPT_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Replace the script blocks of an HTML fragment with one block holding
/// their compressed text, keyed by content hash.
///
/// Fragments without script text come back unchanged, as does everything
/// when compression is disabled.
pub async fn compress_inline_scripts(coordinator: &Coordinator, html: &str) -> Result<String> {
    if html.is_empty() {
        return Ok(String::new());
    }
    if coordinator.config().disabled {
        return Ok(html.to_string());
    }

    let script = extract_script_text(html);
    if script.trim().is_empty() {
        return Ok(html.to_string());
    }

    let served = coordinator
        .compress(CompressRequest::inline(AssetKind::Js, script))
        .await?;
    Ok(format!(
        "\n<script type=\"text/javascript\">\n{}\n</script>\n",
        served.into_text()
    ))
}

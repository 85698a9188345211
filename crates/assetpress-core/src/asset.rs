//! Asset kinds and the record stored in the job cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Type of source text handled by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Js,
    Css,
}

impl AssetKind {
    /// Required file extension, including the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            AssetKind::Js => ".js",
            AssetKind::Css => ".css",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AssetKind::Js => "application/javascript",
            AssetKind::Css => "text/css",
        }
    }

    /// First URL path segment for this kind.
    pub fn url_prefix(&self) -> &'static str {
        match self {
            AssetKind::Js => "j",
            AssetKind::Css => "c",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetKind::Js => "JS",
            AssetKind::Css => "CSS",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Js => write!(f, "js"),
            AssetKind::Css => write!(f, "css"),
        }
    }
}

impl std::str::FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "js" | "javascript" => Ok(AssetKind::Js),
            "css" => Ok(AssetKind::Css),
            other => Err(format!("Unknown asset kind: {}", other)),
        }
    }
}

/// A value held in the job cache under one fingerprint key.
///
/// A key moves through at most two writes before it expires: a
/// `Processing` placeholder, then `Ready` or `Failed`. `Appended` is written
/// once by the append path, which never has a pending window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CachedAsset {
    Processing {
        source: String,
        kind: AssetKind,
        since: DateTime<Utc>,
    },
    Ready {
        output: String,
        job_name: String,
        compressed_at: DateTime<Utc>,
    },
    Failed {
        source: String,
        diagnostic: String,
        failed_at: DateTime<Utc>,
    },
    Appended {
        output: String,
    },
}

impl CachedAsset {
    pub fn processing(kind: AssetKind, source: impl Into<String>) -> Self {
        CachedAsset::Processing {
            source: source.into(),
            kind,
            since: Utc::now(),
        }
    }

    pub fn ready(job_name: impl Into<String>, output: impl Into<String>) -> Self {
        CachedAsset::Ready {
            output: output.into(),
            job_name: job_name.into(),
            compressed_at: Utc::now(),
        }
    }

    pub fn failed(source: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        CachedAsset::Failed {
            source: source.into(),
            diagnostic: diagnostic.into(),
            failed_at: Utc::now(),
        }
    }

    pub fn appended(output: impl Into<String>) -> Self {
        CachedAsset::Appended {
            output: output.into(),
        }
    }

    pub fn state(&self) -> AssetState {
        match self {
            CachedAsset::Processing { .. } => AssetState::Processing,
            CachedAsset::Ready { .. } => AssetState::Ready,
            CachedAsset::Failed { .. } => AssetState::Failed,
            CachedAsset::Appended { .. } => AssetState::Appended,
        }
    }

    /// No further write is expected for this key before it expires.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CachedAsset::Processing { .. })
    }

    /// Text served to clients. Non-final states carry a marker comment ahead
    /// of the original source so text-probing callers can tell them apart.
    pub fn render(&self) -> String {
        match self {
            CachedAsset::Processing {
                source,
                kind,
                since,
            } => format!(
                "/* Processing {} compression {} */\n{}",
                kind.label(),
                since.format(TIMESTAMP_FORMAT),
                source
            ),
            CachedAsset::Ready {
                output,
                job_name,
                compressed_at,
            } => format!(
                "/* {} \n   Compressed: {} */\n{}",
                job_name,
                compressed_at.format(TIMESTAMP_FORMAT),
                output
            ),
            CachedAsset::Failed {
                source, failed_at, ..
            } => format!(
                "/* Compression failed {} */\n{}",
                failed_at.format(TIMESTAMP_FORMAT),
                source
            ),
            CachedAsset::Appended { output } => output.clone(),
        }
    }
}

/// Coarse state reported alongside served text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetState {
    /// Not served from cache; the caller received its own input back.
    Original,
    Processing,
    Ready,
    Failed,
    Appended,
}

impl AssetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetState::Original => "original",
            AssetState::Processing => "processing",
            AssetState::Ready => "ready",
            AssetState::Failed => "failed",
            AssetState::Appended => "appended",
        }
    }
}

/// Result of a coordinator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Served {
    /// Cache miss, empty input, or compression disabled.
    Original(String),
    /// Whatever was cached, final or not.
    Cached(CachedAsset),
}

impl Served {
    pub fn state(&self) -> AssetState {
        match self {
            Served::Original(_) => AssetState::Original,
            Served::Cached(asset) => asset.state(),
        }
    }

    pub fn is_final(&self) -> bool {
        match self {
            Served::Original(_) => false,
            Served::Cached(asset) => matches!(
                asset,
                CachedAsset::Ready { .. } | CachedAsset::Appended { .. }
            ),
        }
    }

    pub fn text(&self) -> String {
        match self {
            Served::Original(text) => text.clone(),
            Served::Cached(asset) => asset.render(),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Served::Original(text) => text,
            Served::Cached(asset) => asset.render(),
        }
    }
}

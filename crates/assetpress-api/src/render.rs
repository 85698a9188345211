//! Tag rendering for templates.
//!
//! Templates queue files per group with [`AssetGroups::add`] and emit the
//! tags once with [`TagRenderer::render`].

use assetpress_core::{AssetKind, Error, Result};
use assetpress_fingerprint::{FingerprintCodec, is_valid_group};
use std::fmt::Write;
use std::str::FromStr;
use std::sync::Arc;

/// What the server does with a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Compress,
    Append,
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_matches(['"', '\'']).to_ascii_lowercase().as_str() {
            "compress" => Ok(Action::Compress),
            "append" => Ok(Action::Append),
            other => Err(Error::Payload(format!(
                "Unknown action '{}': the only options are 'compress' and 'append'",
                other
            ))),
        }
    }
}

/// Files queued under one group for one kind and action, in queue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    pub kind: AssetKind,
    pub action: Action,
    pub group: String,
    pub files: Vec<String>,
}

/// Groups in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct AssetGroups {
    entries: Vec<GroupEntry>,
}

impl AssetGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a file. Group names must be alphanumeric.
    pub fn add(
        &mut self,
        kind: AssetKind,
        action: Action,
        group: &str,
        file: impl Into<String>,
    ) -> Result<()> {
        if !is_valid_group(group) {
            return Err(Error::Payload(format!(
                "The group name can only be an alphanumeric value: {}",
                group
            )));
        }

        let file = file.into();
        match self
            .entries
            .iter_mut()
            .find(|e| e.kind == kind && e.action == action && e.group == group)
        {
            Some(entry) => entry.files.push(file),
            None => self.entries.push(GroupEntry {
                kind,
                action,
                group: group.to_string(),
                files: vec![file],
            }),
        }
        Ok(())
    }

    pub fn entries(&self) -> &[GroupEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Turns queued groups into `<script>` tags or CSS `@import` blocks.
pub struct TagRenderer {
    codec: Arc<FingerprintCodec>,
    mount: String,
    content_url: String,
    expand: bool,
}

impl TagRenderer {
    pub fn new(codec: Arc<FingerprintCodec>, content_url: impl Into<String>) -> Self {
        Self {
            codec,
            mount: String::new(),
            content_url: content_url.into(),
            expand: false,
        }
    }

    /// Prefix for group URLs, e.g. where the router is nested.
    pub fn with_mount(mut self, mount: impl Into<String>) -> Self {
        self.mount = mount.into().trim_end_matches('/').to_string();
        self
    }

    /// Link every file directly under the content URL instead.
    pub fn with_expand(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }

    /// Render all groups of `kind`: compressed groups first, then appended
    /// ones, each in queue order.
    pub fn render(&self, groups: &AssetGroups, kind: AssetKind) -> Result<String> {
        let mut buf = String::new();
        for action in [Action::Compress, Action::Append] {
            for entry in groups
                .entries()
                .iter()
                .filter(|e| e.kind == kind && e.action == action)
            {
                for url in self.urls(entry)? {
                    write_tag(&mut buf, kind, &url);
                }
            }
        }

        Ok(match kind {
            AssetKind::Js => buf,
            AssetKind::Css => format!("<style type=\"text/css\">\n{}</style>", buf),
        })
    }

    /// Group URL for one entry, encoding it with the codec.
    pub fn group_url(&self, entry: &GroupEntry) -> Result<String> {
        let payload = self.codec.encode(entry.kind, entry.files.as_slice(), &entry.group)?;
        Ok(format!(
            "{}{}",
            self.mount,
            payload.path(entry.action == Action::Append)
        ))
    }

    fn urls(&self, entry: &GroupEntry) -> Result<Vec<String>> {
        if self.expand {
            let base = self.content_url.trim_end_matches('/');
            Ok(entry
                .files
                .iter()
                .map(|f| format!("{}/{}", base, f))
                .collect())
        } else {
            Ok(vec![self.group_url(entry)?])
        }
    }
}

fn write_tag(buf: &mut String, kind: AssetKind, url: &str) {
    // Writing to a String cannot fail.
    let _ = match kind {
        AssetKind::Js => writeln!(buf, "<script type=\"text/javascript\" src=\"{}\"></script>", url),
        AssetKind::Css => writeln!(buf, "  @import url({});", url),
    };
}

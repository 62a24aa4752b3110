//! Git types

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Information about a git commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Commit hash (full)
    pub hash: String,
    /// Short hash (first 7 characters)
    pub short_hash: String,
    /// Commit message (first line)
    pub message: String,
    /// Rest of the commit message
    pub body: Option<String>,
    /// Author name
    pub author: String,
    /// Author email
    pub author_email: String,
    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
    /// Paths touched by the commit, relative to the repository root.
    /// `None` when the paths were never resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_paths: Option<Vec<PathBuf>>,
}

impl CommitInfo {
    /// Create a new CommitInfo
    pub fn new(
        hash: impl Into<String>,
        message: impl Into<String>,
        author: impl Into<String>,
        author_email: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let hash = hash.into();
        let short_hash = hash.chars().take(7).collect();

        Self {
            hash,
            short_hash,
            message: message.into(),
            body: None,
            author: author.into(),
            author_email: author_email.into(),
            timestamp,
            changed_paths: None,
        }
    }

    /// Set the commit body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the changed paths
    pub fn with_changed_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.changed_paths = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    /// Body text, empty when the commit has none
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    /// Whether any changed path lies under one of `prefixes`.
    ///
    /// Matching is per path component, so `overrides` covers
    /// `overrides/config/a.cfg` but not `overrides2/a.cfg`. A commit whose
    /// paths are unknown touches nothing.
    pub fn touches_any(&self, prefixes: &[PathBuf]) -> bool {
        let Some(paths) = &self.changed_paths else {
            return false;
        };
        paths
            .iter()
            .any(|path| prefixes.iter().any(|prefix| Path::new(path).starts_with(prefix)))
    }
}

/// Information about a git tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagInfo {
    /// Tag name
    pub name: String,
    /// Commit hash the tag points to
    pub commit_hash: String,
    /// Tag timestamp (annotated tags only)
    pub timestamp: Option<DateTime<Utc>>,
    /// Extracted version from tag name
    pub version: Option<String>,
}

impl TagInfo {
    /// Create a new TagInfo
    pub fn new(name: impl Into<String>, commit_hash: impl Into<String>) -> Self {
        let name = name.into();
        let version = extract_version(&name);

        Self {
            name,
            commit_hash: commit_hash.into(),
            timestamp: None,
            version,
        }
    }

    /// Set the timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Extract version from a tag name
fn extract_version(tag: &str) -> Option<String> {
    // v1.0.0, 1.0.0, pack@1.0.0, pack-v1.0.0
    let tag = tag.strip_prefix('v').unwrap_or(tag);

    if let Some(pos) = tag.rfind('@') {
        let version_part = &tag[pos + 1..];
        let version = version_part.strip_prefix('v').unwrap_or(version_part);
        if looks_like_version(version) {
            return Some(version.to_string());
        }
    }

    if let Some(pos) = tag.rfind("-v") {
        let version = &tag[pos + 2..];
        if looks_like_version(version) {
            return Some(version.to_string());
        }
    }

    if looks_like_version(tag) {
        return Some(tag.to_string());
    }

    None
}

fn looks_like_version(s: &str) -> bool {
    let mut parts = s.split('.');
    let major = parts.next().unwrap_or_default();
    parts.next().is_some() && major.parse::<u64>().is_ok()
}

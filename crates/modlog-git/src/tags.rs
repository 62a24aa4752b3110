//! Release tag lookup

use chrono::{TimeZone, Utc};
use regex::Regex;
use semver::Version;
use tracing::{debug, instrument};

use crate::repository::{GitRepo, Result};
use crate::types::TagInfo;
use modlog_core::error::GitError;

impl GitRepo {
    /// Get all tags, lightweight and annotated
    #[instrument(skip(self))]
    pub fn tags(&self) -> Result<Vec<TagInfo>> {
        let mut tags = Vec::new();

        self.repo.tag_foreach(|oid, name| {
            let name = String::from_utf8_lossy(name)
                .trim_start_matches("refs/tags/")
                .to_string();

            if let Ok(commit) = self.repo.find_commit(oid) {
                tags.push(TagInfo::new(&name, commit.id().to_string()));
            } else if let Ok(tag) = self.repo.find_tag(oid) {
                let mut tag_info = TagInfo::new(&name, tag.target_id().to_string());
                if let Some(tagger) = tag.tagger() {
                    let timestamp = Utc
                        .timestamp_opt(tagger.when().seconds(), 0)
                        .single()
                        .unwrap_or_else(Utc::now);
                    tag_info = tag_info.with_timestamp(timestamp);
                }
                tags.push(tag_info);
            }

            true
        })?;

        debug!(count = tags.len(), "listed all tags");
        Ok(tags)
    }

    /// Find the release tag with the highest version.
    ///
    /// `pattern` is a regex the tag name must match; tags without a semantic
    /// version in their name are never considered releases.
    #[instrument(skip(self), fields(pattern))]
    pub fn latest_release_tag(&self, pattern: Option<&str>) -> Result<Option<TagInfo>> {
        let filter = pattern
            .map(|p| {
                Regex::new(p).map_err(|e| GitError::InvalidTagPattern {
                    pattern: p.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let latest = self
            .tags()?
            .into_iter()
            .filter(|t| filter.as_ref().map_or(true, |re| re.is_match(&t.name)))
            .filter_map(|t| {
                let version = t.version.as_deref().and_then(|v| Version::parse(v).ok())?;
                Some((t, version))
            })
            .max_by(|a, b| a.1.cmp(&b.1))
            .map(|(t, _)| t);

        debug!(latest = ?latest.as_ref().map(|t| &t.name), "resolved latest release tag");
        Ok(latest)
    }
}

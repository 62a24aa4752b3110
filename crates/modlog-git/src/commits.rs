//! Commit history operations

use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use git2::{DiffOptions, Sort};
use tracing::{debug, instrument};

use crate::repository::{GitRepo, Result};
use crate::types::CommitInfo;

impl GitRepo {
    /// Get the commits reachable from `to` but not from `since`, oldest
    /// first, with their changed paths resolved.
    ///
    /// Without `since` the whole history up to `to` is returned.
    #[instrument(skip(self), fields(since, to))]
    pub fn commits_between(&self, since: Option<&str>, to: &str) -> Result<Vec<CommitInfo>> {
        let to_oid = self.resolve(to)?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)?;
        revwalk.push(to_oid)?;
        if let Some(since) = since {
            revwalk.hide(self.resolve(since)?)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            let paths = self.changed_paths(&commit)?;
            commits.push(commit_to_info(&commit).with_changed_paths(paths));
        }

        debug!(count = commits.len(), "collected commits");
        Ok(commits)
    }

    /// Paths changed by a commit relative to its first parent
    fn changed_paths(&self, commit: &git2::Commit<'_>) -> Result<Vec<PathBuf>> {
        let tree = commit.tree()?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        let mut opts = DiffOptions::new();
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?;

        let paths = diff
            .deltas()
            .filter_map(|delta| {
                delta
                    .new_file()
                    .path()
                    .or_else(|| delta.old_file().path())
                    .map(Path::to_path_buf)
            })
            .collect();

        Ok(paths)
    }
}

/// Convert a git2 Commit to CommitInfo
fn commit_to_info(commit: &git2::Commit<'_>) -> CommitInfo {
    let hash = commit.id().to_string();
    let author = commit.author();

    let message = commit.summary().unwrap_or("(no message)").to_string();

    let timestamp = Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_else(Utc::now);

    let info = CommitInfo::new(
        hash,
        message,
        author.name().unwrap_or("Unknown"),
        author.email().unwrap_or("unknown@example.com"),
        timestamp,
    );

    match commit.body() {
        Some(body) => info.with_body(body),
        None => info,
    }
}

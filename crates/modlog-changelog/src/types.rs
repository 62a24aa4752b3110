//! Changelog types

use std::fmt;

use chrono::{DateTime, Utc};
use modlog_git::CommitInfo;
use serde::{Deserialize, Serialize};

/// Length of an abbreviated commit hash
pub const SHORT_HASH_LEN: usize = 7;

/// One bullet of the changelog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    /// Rendered message text
    pub text: String,
    /// Full hashes of the commits this entry came from; empty for mod changes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commits: Vec<String>,
    /// Additional messages from an expand list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_messages: Vec<String>,
    /// Details from a details list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ChangelogEntry {
    /// Create an entry with no source commits
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            commits: Vec::new(),
            sub_messages: Vec::new(),
            details: Vec::new(),
        }
    }

    /// Attribute the entry to a commit
    pub fn with_commit(mut self, hash: impl Into<String>) -> Self {
        self.commits.push(hash.into());
        self
    }

    /// Set the expand list
    pub fn with_sub_messages(mut self, sub_messages: Vec<String>) -> Self {
        self.sub_messages = sub_messages;
        self
    }

    /// Set the details list
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    /// Whether a commit reference (full hash or prefix) is one of the sources
    pub fn references(&self, reference: &str) -> bool {
        !reference.is_empty() && self.commits.iter().any(|hash| hash.starts_with(reference))
    }
}

/// A sub-category block of the document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubSection {
    /// Sub-category display name, may be empty
    pub title: String,
    /// Entries in insertion order
    pub entries: Vec<ChangelogEntry>,
}

/// A category block of the document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Category display name
    pub title: String,
    /// Non-empty sub-categories in taxonomy order
    pub sub_sections: Vec<SubSection>,
}

/// A commit listed in the commit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Full hash
    pub hash: String,
    /// First 7 characters of the hash
    pub short_hash: String,
    /// Subject line as written
    pub message: String,
    /// Author name
    pub author: String,
}

impl From<&CommitInfo> for CommitSummary {
    fn from(commit: &CommitInfo) -> Self {
        Self {
            hash: commit.hash.clone(),
            short_hash: commit.short_hash.clone(),
            message: commit.message.clone(),
            author: commit.author.clone(),
        }
    }
}

/// The finished changelog, ready for rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogDocument {
    /// Document title
    pub title: String,
    /// Generation date
    pub date: DateTime<Utc>,
    /// Non-empty categories in taxonomy order
    pub sections: Vec<Section>,
    /// Commits that contributed entries, oldest first
    #[serde(default)]
    pub commits: Vec<CommitSummary>,
}

impl ChangelogDocument {
    /// Find a section by category name
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }

    /// Entries of one (category, sub-category) bucket; empty if absent
    pub fn entries(&self, category: &str, sub_category: &str) -> &[ChangelogEntry] {
        self.section(category)
            .and_then(|section| section.sub_sections.iter().find(|s| s.title == sub_category))
            .map(|sub| sub.entries.as_slice())
            .unwrap_or_default()
    }

    /// Check if the document has no entries
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// A recovered per-commit problem reported to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A fix-up line could not be understood
    MalformedDirective {
        /// Short hash of the fix-up commit
        commit: String,
        /// The offending line
        line: String,
        /// What was wrong with it
        reason: String,
    },
    /// A fix-up pointed at a commit with no matching entry
    FixUpTargetNotFound {
        /// Short hash of the fix-up commit
        commit: String,
        /// The reference it used
        target: String,
    },
    /// A fix-up reference matched entries of more than one commit
    AmbiguousFixUpTarget {
        /// Short hash of the fix-up commit
        commit: String,
        /// The reference it used
        target: String,
        /// Short hashes of the commits it matched
        candidates: Vec<String>,
    },
    /// Marker stripping left nothing to print
    EmptyMessage {
        /// Short hash of the commit
        commit: String,
    },
    /// A mod change template referenced a version the change lacks
    MissingVersion {
        /// Mod name
        mod_name: String,
        /// Placeholder that rendered empty
        placeholder: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedDirective {
                commit,
                line,
                reason,
            } => write!(f, "{}: ignored fix-up '{}': {}", commit, line, reason),
            Self::FixUpTargetNotFound { commit, target } => {
                write!(f, "{}: fix-up target {} has no changelog entry", commit, target)
            }
            Self::AmbiguousFixUpTarget {
                commit,
                target,
                candidates,
            } => write!(
                f,
                "{}: fix-up target {} is ambiguous ({}), not applied",
                commit,
                target,
                candidates.join(", ")
            ),
            Self::EmptyMessage { commit } => {
                write!(f, "{}: message is empty once markers are removed", commit)
            }
            Self::MissingVersion {
                mod_name,
                placeholder,
            } => write!(f, "{}: no value for {}", mod_name, placeholder),
        }
    }
}

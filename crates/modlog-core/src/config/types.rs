//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::{
    DEFAULT_ADDED_TEMPLATE, DEFAULT_CHANGELOG_FILE, DEFAULT_MANIFEST_PATH, DEFAULT_OVERRIDES_DIR,
    DEFAULT_REMOVED_TEMPLATE, DEFAULT_TITLE, DEFAULT_UPDATED_TEMPLATE,
};

/// Main configuration for modlog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Version of the config schema
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Project name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Git configuration
    pub git: GitConfig,

    /// Changelog configuration
    pub changelog: ChangelogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: None,
            name: None,
            git: GitConfig::default(),
            changelog: ChangelogConfig::default(),
        }
    }
}

/// Git configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Regex restricting which tags count as releases
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_pattern: Option<String>,

    /// Fixed base revision; overrides the latest release tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
}

/// Changelog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
    /// Changelog file path
    pub file: PathBuf,

    /// Document title
    pub title: String,

    /// Directories handled by the overrides pass
    pub overrides: Vec<PathBuf>,

    /// Mod manifest path, handled by the manifest pass and used for mod diffs
    pub manifest: PathBuf,

    /// Whether to include short commit hashes after entries
    pub include_hashes: bool,

    /// Whether to append the list of contributing commits
    pub include_commit_log: bool,

    /// Web URL of the repository; commit hashes link to `<repo_url>/commit/<hash>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,

    /// Templates for mod change entries
    pub templates: ModTemplatesConfig,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_CHANGELOG_FILE),
            title: DEFAULT_TITLE.to_string(),
            overrides: vec![PathBuf::from(DEFAULT_OVERRIDES_DIR)],
            manifest: PathBuf::from(DEFAULT_MANIFEST_PATH),
            include_hashes: false,
            include_commit_log: true,
            repo_url: None,
            templates: ModTemplatesConfig::default(),
        }
    }
}

/// Templates used to render mod additions, updates and removals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModTemplatesConfig {
    /// Template for added mods
    pub added: String,

    /// Template for updated mods
    pub updated: String,

    /// Template for removed mods
    pub removed: String,
}

impl Default for ModTemplatesConfig {
    fn default() -> Self {
        Self {
            added: DEFAULT_ADDED_TEMPLATE.to_string(),
            updated: DEFAULT_UPDATED_TEMPLATE.to_string(),
            removed: DEFAULT_REMOVED_TEMPLATE.to_string(),
        }
    }
}

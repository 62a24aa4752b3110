//! Mod change allocation
//!
//! Mod additions, updates and removals come from a manifest diff, not from
//! commit text. Each kind has a fixed bucket and a template.

use std::collections::BTreeMap;
use std::fmt;

use modlog_core::config::{ModTemplatesConfig, MOD_NAME_KEY, OLD_VERSION_KEY, PLACEHOLDER_PATTERN};
use modlog_core::error::ChangelogError;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::accumulator::Changelog;
use crate::taxonomy::{
    SlotId, Taxonomy, GENERAL_CATEGORY, MOD_ADDITIONS_SUB_CATEGORY, MOD_REMOVALS_SUB_CATEGORY,
    MOD_UPDATES_SUB_CATEGORY,
};
use crate::types::{ChangelogEntry, Warning};
use crate::Result;

/// Kind of mod change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModChangeKind {
    /// Mod added to the pack
    Added,
    /// Mod version changed
    Updated,
    /// Mod removed from the pack
    Removed,
}

impl fmt::Display for ModChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Added => "added",
            Self::Updated => "updated",
            Self::Removed => "removed",
        };
        f.write_str(name)
    }
}

/// A single mod change fact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModChange {
    /// What happened to the mod
    pub kind: ModChangeKind,
    /// Mod display name
    pub mod_name: String,
    /// Version before the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_version: Option<String>,
    /// Version after the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_version: Option<String>,
}

impl ModChange {
    /// A newly added mod
    pub fn added(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind: ModChangeKind::Added,
            mod_name: name.into(),
            old_version: None,
            new_version: Some(version.into()),
        }
    }

    /// A mod whose version changed
    pub fn updated(
        name: impl Into<String>,
        old_version: impl Into<String>,
        new_version: impl Into<String>,
    ) -> Self {
        Self {
            kind: ModChangeKind::Updated,
            mod_name: name.into(),
            old_version: Some(old_version.into()),
            new_version: Some(new_version.into()),
        }
    }

    /// A removed mod
    pub fn removed(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind: ModChangeKind::Removed,
            mod_name: name.into(),
            old_version: Some(version.into()),
            new_version: None,
        }
    }
}

/// Where one kind of mod change goes and how it is worded
#[derive(Debug, Clone)]
pub struct ModAllocation {
    /// Destination bucket
    pub slot: SlotId,
    /// Template with `{{{modName}}}`, `{{{oldVersion}}}`, `{{{newVersion}}}`
    pub template: String,
}

/// Maps mod change facts onto fixed buckets
#[derive(Debug, Clone)]
pub struct ModChangeAllocator {
    placeholders: Regex,
    added: ModAllocation,
    updated: ModAllocation,
    removed: ModAllocation,
}

impl ModChangeAllocator {
    /// Resolve the General Changes mod buckets and pair them with templates
    pub fn new(taxonomy: &Taxonomy, templates: &ModTemplatesConfig) -> Result<Self> {
        let allocation = |sub_category: &str, template: &str| -> Result<ModAllocation> {
            Ok(ModAllocation {
                slot: taxonomy.require_slot(GENERAL_CATEGORY, sub_category)?,
                template: template.to_string(),
            })
        };

        let placeholders = Regex::new(PLACEHOLDER_PATTERN).map_err(|e| ChangelogError::Template {
            kind: "placeholder".to_string(),
            reason: e.to_string(),
        })?;

        let allocator = Self {
            placeholders,
            added: allocation(MOD_ADDITIONS_SUB_CATEGORY, &templates.added)?,
            updated: allocation(MOD_UPDATES_SUB_CATEGORY, &templates.updated)?,
            removed: allocation(MOD_REMOVALS_SUB_CATEGORY, &templates.removed)?,
        };

        for kind in [ModChangeKind::Added, ModChangeKind::Updated, ModChangeKind::Removed] {
            if !allocator.placeholders.is_match(&allocator.allocation(kind).template) {
                return Err(ChangelogError::Template {
                    kind: kind.to_string(),
                    reason: "template has no placeholders".to_string(),
                });
            }
        }

        Ok(allocator)
    }

    /// Allocation for a kind
    pub fn allocation(&self, kind: ModChangeKind) -> &ModAllocation {
        match kind {
            ModChangeKind::Added => &self.added,
            ModChangeKind::Updated => &self.updated,
            ModChangeKind::Removed => &self.removed,
        }
    }

    /// Render a change through its template.
    ///
    /// Placeholders whose value is missing render empty and are reported.
    pub fn render(&self, change: &ModChange) -> (String, Vec<Warning>) {
        let mut warnings = Vec::new();
        let template = &self.allocation(change.kind).template;

        let text = self.placeholders.replace_all(template, |caps: &Captures<'_>| {
            let key = &caps["key"];
            let value = match key {
                MOD_NAME_KEY => Some(change.mod_name.as_str()),
                OLD_VERSION_KEY => change.old_version.as_deref(),
                _ => change.new_version.as_deref(),
            };
            value.map(str::to_string).unwrap_or_else(|| {
                warnings.push(Warning::MissingVersion {
                    mod_name: change.mod_name.clone(),
                    placeholder: key.to_string(),
                });
                String::new()
            })
        });

        (text.into_owned(), warnings)
    }

    /// Append every change to its bucket, in input order
    pub fn allocate(&self, changes: &[ModChange], changelog: &mut Changelog) -> Vec<Warning> {
        let mut warnings = Vec::new();

        for change in changes {
            let (text, problems) = self.render(change);
            for problem in &problems {
                warn!(%problem, "incomplete mod change");
            }
            warnings.extend(problems);
            changelog.push(self.allocation(change.kind).slot, ChangelogEntry::new(text));
        }

        debug!(count = changes.len(), "allocated mod changes");
        warnings
    }
}

/// A mod listed in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModRecord {
    /// Mod display name
    pub name: String,
    /// Installed version
    pub version: String,
}

/// The mod list of a pack at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModManifest {
    /// Installed mods
    #[serde(default)]
    pub mods: Vec<ModRecord>,
}

impl ModManifest {
    /// Parse a JSON manifest
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| ChangelogError::Manifest(e.to_string()))
    }

    /// Compare two manifests, ordered by mod name
    pub fn diff(old: &ModManifest, new: &ModManifest) -> Vec<ModChange> {
        let old_mods: BTreeMap<&str, &str> = old
            .mods
            .iter()
            .map(|m| (m.name.as_str(), m.version.as_str()))
            .collect();
        let new_mods: BTreeMap<&str, &str> = new
            .mods
            .iter()
            .map(|m| (m.name.as_str(), m.version.as_str()))
            .collect();

        let mut names: Vec<&str> = old_mods.keys().chain(new_mods.keys()).copied().collect();
        names.sort_unstable();
        names.dedup();

        names
            .into_iter()
            .filter_map(|name| match (old_mods.get(name), new_mods.get(name)) {
                (None, Some(new)) => Some(ModChange::added(name, *new)),
                (Some(old), None) => Some(ModChange::removed(name, *old)),
                (Some(old), Some(new)) if old != new => Some(ModChange::updated(name, *old, *new)),
                _ => None,
            })
            .collect()
    }
}

//! Changelog generation

use modlog_core::config::ChangelogConfig;
use modlog_git::CommitInfo;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::accumulator::Changelog;
use crate::formatter::{ChangelogFormatter, MarkdownFormatter};
use crate::mods::{ModChange, ModChangeAllocator};
use crate::pipeline::{CommitState, Pipeline};
use crate::taxonomy::Taxonomy;
use crate::types::{ChangelogDocument, Warning};
use crate::Result;

/// A generated document plus everything recovered along the way
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedChangelog {
    /// The changelog
    pub document: ChangelogDocument,
    /// Per-commit and per-mod problems, in the order they were found
    pub warnings: Vec<Warning>,
    /// Final state of each input commit
    pub states: Vec<CommitState>,
}

/// Changelog generator
pub struct ChangelogGenerator {
    taxonomy: Taxonomy,
    pipeline: Pipeline,
    allocator: ModChangeAllocator,
    formatter: MarkdownFormatter,
    config: ChangelogConfig,
}

impl ChangelogGenerator {
    /// Create a generator over the standard taxonomy
    pub fn new(config: ChangelogConfig) -> Result<Self> {
        Self::with_taxonomy(Taxonomy::standard()?, config)
    }

    /// Create a generator over a custom taxonomy.
    ///
    /// The taxonomy must provide the general category's `Other` and mod
    /// buckets.
    pub fn with_taxonomy(taxonomy: Taxonomy, config: ChangelogConfig) -> Result<Self> {
        let pipeline = Pipeline::standard(&taxonomy, &config)?;
        let allocator = ModChangeAllocator::new(&taxonomy, &config.templates)?;

        Ok(Self {
            taxonomy,
            pipeline,
            allocator,
            formatter: MarkdownFormatter::new(),
            config,
        })
    }

    /// Classify `commits` (oldest first) and append `mod_changes`
    #[instrument(skip_all, fields(commit_count = commits.len(), mod_count = mod_changes.len()))]
    pub fn generate(&self, commits: &[CommitInfo], mod_changes: &[ModChange]) -> GeneratedChangelog {
        info!(
            commit_count = commits.len(),
            mod_count = mod_changes.len(),
            "generating changelog"
        );
        let mut changelog = Changelog::new(&self.taxonomy);

        let report = self.pipeline.run(&self.taxonomy, commits, &mut changelog);
        let states = report.states;
        let mut warnings = report.warnings;
        warnings.extend(self.allocator.allocate(mod_changes, &mut changelog));

        let commit_log = if self.config.include_commit_log {
            report.commit_log
        } else {
            Vec::new()
        };

        let document = changelog.into_document(&self.taxonomy, &self.config.title, commit_log);
        debug!(
            section_count = document.sections.len(),
            warning_count = warnings.len(),
            "changelog built"
        );

        GeneratedChangelog {
            document,
            warnings,
            states,
        }
    }

    /// Render a document as markdown
    pub fn format(&self, document: &ChangelogDocument) -> String {
        self.formatter.format(document, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_commit(hash: &str, message: &str, body: &str, paths: &[&str]) -> CommitInfo {
        CommitInfo::new(hash, message, "Test Author", "test@example.com", Utc::now())
            .with_body(body)
            .with_changed_paths(paths.iter().copied())
    }

    #[test]
    fn test_generate_changelog() {
        let generator = ChangelogGenerator::new(ChangelogConfig::default()).unwrap();

        let generated = generator.generate(
            &[
                make_commit("aaaa0001", "[BUG][HM] Fix boss", "", &["src/a"]),
                make_commit("aaaa0002", "Tweak ores", "", &["overrides/ores.cfg"]),
                make_commit("aaaa0003", "Update build", "", &["tools/build.ts"]),
            ],
            &[ModChange::updated("Foo", "1.0", "2.0")],
        );

        let document = &generated.document;
        let titles: Vec<_> = document.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Bug Fixes", "General Changes"]);
        assert_eq!(document.entries("Bug Fixes", "Hard Mode")[0].text, "Fix boss");
        assert_eq!(
            document.entries("General Changes", "Mod Updates")[0].text,
            "Foo: *v1.0 ⇥ v2.0*"
        );
        assert_eq!(document.entries("General Changes", "Other")[0].text, "Tweak ores");
        assert_eq!(document.commits.len(), 2);
        assert_eq!(generated.states[2], CommitState::Unclaimed);
        assert!(generated.warnings.is_empty());
    }

    #[test]
    fn test_mod_updates_listed_before_other() {
        let generator = ChangelogGenerator::new(ChangelogConfig::default()).unwrap();
        let generated = generator.generate(
            &[make_commit("aaaa0001", "[GENERAL] Tweak", "", &[])],
            &[ModChange::added("Bar", "1")],
        );

        let subs: Vec<_> = generated.document.sections[0]
            .sub_sections
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(subs, ["Mod Additions", "Other"]);
    }

    #[test]
    fn test_commit_log_can_be_disabled() {
        let config = ChangelogConfig {
            include_commit_log: false,
            ..Default::default()
        };
        let generator = ChangelogGenerator::new(config).unwrap();
        let generated = generator.generate(&[make_commit("aaaa0001", "[BUG] Fix", "", &[])], &[]);

        assert!(generated.document.commits.is_empty());
    }

    #[test]
    fn test_missing_version_surfaces_as_warning() {
        let generator = ChangelogGenerator::new(ChangelogConfig::default()).unwrap();
        let change = ModChange {
            new_version: None,
            ..ModChange::added("Bar", "1")
        };

        let generated = generator.generate(&[], &[change]);

        assert_eq!(generated.warnings.len(), 1);
        assert_eq!(
            generated.document.entries("General Changes", "Mod Additions")[0].text,
            "Bar: *v*"
        );
    }

    #[test]
    fn test_format_changelog() {
        let generator = ChangelogGenerator::new(ChangelogConfig::default()).unwrap();

        let generated = generator.generate(
            &[make_commit("aaaa0001", "[FEATURE][QOL] Sort inventory", "", &[])],
            &[],
        );
        let formatted = generator.format(&generated.document);

        assert!(formatted.starts_with("# Changelog\n"));
        assert!(formatted.contains("## Feature Additions\n\n### Quality of Life\n\n* Sort inventory\n"));
        assert!(formatted.contains("## Commits"));
    }
}

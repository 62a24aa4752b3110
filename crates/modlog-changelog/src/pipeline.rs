//! Pass pipeline
//!
//! Commits flow through an ordered list of passes. A pass sees only the
//! commits no earlier pass has claimed, optionally narrowed to those touching
//! a set of paths. Skipping a commit is not claiming it.

use std::path::PathBuf;

use modlog_core::config::ChangelogConfig;
use modlog_git::CommitInfo;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::accumulator::Changelog;
use crate::fixup::{parse_directives, FixUpResolver};
use crate::markers::{has_skip_marker, Classification, MarkerParser};
use crate::taxonomy::{SlotId, Taxonomy, GENERAL_CATEGORY, OTHER_SUB_CATEGORY};
use crate::types::{ChangelogEntry, CommitSummary, Warning};
use crate::Result;

/// How a pass selects commits and which ones it claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassKind {
    /// Collects fix-up directives, newest commit first. Claims every commit
    /// carrying the fix-up marker and adds no entries.
    FixUp,
    /// Handles commits touching any of `dirs`. Commits without a category go
    /// to `leftover` when set and are otherwise left for later passes.
    Scoped {
        /// Path prefixes, relative to the repository root
        dirs: Vec<PathBuf>,
        /// Bucket for commits that match no category
        leftover: Option<SlotId>,
    },
    /// Sees every remaining commit and claims the ones it classifies
    Terminal,
}

/// One stage of the pipeline
#[derive(Debug, Clone)]
pub struct Pass {
    /// Name used in logs
    pub name: String,
    /// Selection and claiming behaviour
    pub kind: PassKind,
    /// Whether claimed commits with entries go to the commit log
    pub log_commits: bool,
}

impl Pass {
    /// The fix-up pass
    pub fn fix_up() -> Self {
        Self {
            name: "fixup".to_string(),
            kind: PassKind::FixUp,
            log_commits: false,
        }
    }

    /// A pass restricted to commits touching `dirs`
    pub fn scoped(name: impl Into<String>, dirs: Vec<PathBuf>, leftover: Option<SlotId>) -> Self {
        Self {
            name: name.into(),
            kind: PassKind::Scoped { dirs, leftover },
            log_commits: true,
        }
    }

    /// The unscoped last pass
    pub fn terminal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PassKind::Terminal,
            log_commits: true,
        }
    }

    /// Set whether claimed commits are listed in the commit log
    pub fn with_commit_log(mut self, log_commits: bool) -> Self {
        self.log_commits = log_commits;
        self
    }

    fn in_scope(&self, commit: &CommitInfo) -> bool {
        match &self.kind {
            PassKind::Scoped { dirs, .. } => commit.touches_any(dirs),
            PassKind::FixUp | PassKind::Terminal => true,
        }
    }

    fn skips(&self, commit: &CommitInfo) -> bool {
        match self.kind {
            PassKind::FixUp => false,
            PassKind::Scoped { .. } | PassKind::Terminal => has_skip_marker(commit.body_text()),
        }
    }

    fn claims(&self, outcome: ItemOutcome) -> bool {
        match self.kind {
            PassKind::FixUp => outcome == ItemOutcome::FixUp,
            PassKind::Scoped { .. } => outcome != ItemOutcome::Unclassified,
            PassKind::Terminal => matches!(outcome, ItemOutcome::Classified | ItemOutcome::Empty),
        }
    }

    /// Commit indices in the order this pass visits them
    fn scan_order(&self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        if self.kind == PassKind::FixUp {
            order.reverse();
        }
        order
    }
}

/// What became of a commit after the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitState {
    /// No pass claimed it; it contributes nothing
    Unclaimed,
    /// Claimed and turned into an entry
    ClaimedWithEntry,
    /// Claimed without producing an entry
    ClaimedWithoutEntry,
}

/// Result of one pass over one commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Classified,
    Leftover,
    /// Classified, but nothing was left to print
    Empty,
    Unclassified,
    FixUp,
    NoDirective,
}

impl ItemOutcome {
    fn adds_entry(self) -> bool {
        matches!(self, Self::Classified | Self::Leftover)
    }
}

/// Everything a pipeline run reports besides the entries themselves
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Final state per input commit, in input order
    pub states: Vec<CommitState>,
    /// Recovered per-commit problems
    pub warnings: Vec<Warning>,
    /// Logged commits that still have entries, in input order
    pub commit_log: Vec<CommitSummary>,
}

impl PipelineReport {
    /// Number of commits claimed by any pass
    pub fn claimed(&self) -> usize {
        self.states
            .iter()
            .filter(|state| **state != CommitState::Unclaimed)
            .count()
    }
}

/// Ordered list of passes
#[derive(Debug, Clone)]
pub struct Pipeline {
    passes: Vec<Pass>,
}

impl Pipeline {
    /// Create a pipeline from passes in run order
    pub fn new(passes: Vec<Pass>) -> Self {
        Self { passes }
    }

    /// Fix-up, overrides, manifest, then the terminal pass
    pub fn standard(taxonomy: &Taxonomy, config: &ChangelogConfig) -> Result<Self> {
        let other = taxonomy.require_slot(GENERAL_CATEGORY, OTHER_SUB_CATEGORY)?;

        Ok(Self::new(vec![
            Pass::fix_up(),
            Pass::scoped("overrides", config.overrides.clone(), Some(other)),
            Pass::scoped("manifest", vec![config.manifest.clone()], None),
            Pass::terminal("final"),
        ]))
    }

    /// Passes in run order
    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    /// Run every pass over `commits` (oldest first), writing entries into
    /// `changelog`. Fix-up directives are applied once all passes are done.
    #[instrument(skip_all, fields(commits = commits.len(), passes = self.passes.len()))]
    pub fn run(
        &self,
        taxonomy: &Taxonomy,
        commits: &[CommitInfo],
        changelog: &mut Changelog,
    ) -> PipelineReport {
        let parser = MarkerParser::new(taxonomy);
        let mut resolver = FixUpResolver::new();
        let mut states = vec![CommitState::Unclaimed; commits.len()];
        let mut logged = vec![false; commits.len()];
        let mut warnings = Vec::new();

        for pass in &self.passes {
            let mut claimed = 0;

            for index in pass.scan_order(commits.len()) {
                let commit = &commits[index];
                if states[index] != CommitState::Unclaimed || !pass.in_scope(commit) {
                    continue;
                }
                if pass.skips(commit) {
                    debug!(pass = %pass.name, commit = %commit.short_hash, "skipped");
                    continue;
                }

                let outcome = match &pass.kind {
                    PassKind::FixUp => collect_fix_ups(commit, &mut resolver, &mut warnings),
                    PassKind::Scoped { leftover, .. } => {
                        classify(&parser, commit, *leftover, changelog, &mut warnings)
                    }
                    PassKind::Terminal => classify(&parser, commit, None, changelog, &mut warnings),
                };

                if pass.claims(outcome) {
                    states[index] = if outcome.adds_entry() {
                        CommitState::ClaimedWithEntry
                    } else {
                        CommitState::ClaimedWithoutEntry
                    };
                    logged[index] = pass.log_commits;
                    claimed += 1;
                }
            }

            debug!(pass = %pass.name, claimed, "pass complete");
        }

        warnings.extend(resolver.apply(changelog));

        let commit_log = commits
            .iter()
            .zip(&logged)
            .filter(|(commit, logged)| **logged && changelog.references(&commit.hash))
            .map(|(commit, _)| CommitSummary::from(commit))
            .collect();

        let report = PipelineReport {
            states,
            warnings,
            commit_log,
        };
        debug!(
            claimed = report.claimed(),
            warnings = report.warnings.len(),
            "pipeline complete"
        );
        report
    }
}

fn collect_fix_ups(
    commit: &CommitInfo,
    resolver: &mut FixUpResolver,
    warnings: &mut Vec<Warning>,
) -> ItemOutcome {
    match parse_directives(commit) {
        Some((directives, problems)) => {
            resolver.record(directives);
            warnings.extend(problems);
            ItemOutcome::FixUp
        }
        None => ItemOutcome::NoDirective,
    }
}

fn classify(
    parser: &MarkerParser<'_>,
    commit: &CommitInfo,
    leftover: Option<SlotId>,
    changelog: &mut Changelog,
    warnings: &mut Vec<Warning>,
) -> ItemOutcome {
    let (slot, message, outcome) = match parser.classify(&commit.message, commit.body_text()) {
        Classification::Categorized { slot, message } => (slot, message, ItemOutcome::Classified),
        Classification::NoCategory(message) | Classification::Unmatched(message) => {
            match leftover {
                Some(slot) => (slot, message, ItemOutcome::Leftover),
                None => return ItemOutcome::Unclassified,
            }
        }
    };

    if message.text.is_empty() {
        warn!(commit = %commit.short_hash, "message is empty once markers are removed");
        warnings.push(Warning::EmptyMessage {
            commit: commit.short_hash.clone(),
        });
        return ItemOutcome::Empty;
    }

    changelog.push(
        slot,
        ChangelogEntry::new(message.text)
            .with_commit(&commit.hash)
            .with_sub_messages(message.sub_messages)
            .with_details(message.details),
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn commit(hash: &str, message: &str, body: &str, paths: &[&str]) -> CommitInfo {
        CommitInfo::new(hash, message, "Test Author", "test@example.com", Utc::now())
            .with_body(body)
            .with_changed_paths(paths.iter().copied())
    }

    fn run(commits: &[CommitInfo]) -> (Taxonomy, Changelog, PipelineReport) {
        let taxonomy = Taxonomy::standard().unwrap();
        let pipeline = Pipeline::standard(&taxonomy, &ChangelogConfig::default()).unwrap();
        let mut changelog = Changelog::new(&taxonomy);
        let report = pipeline.run(&taxonomy, commits, &mut changelog);
        (taxonomy, changelog, report)
    }

    fn texts(changelog: &Changelog, slot: SlotId) -> Vec<String> {
        changelog.entries(slot).iter().map(|e| e.text.clone()).collect()
    }

    #[test]
    fn test_standard_pass_order() {
        let taxonomy = Taxonomy::standard().unwrap();
        let pipeline = Pipeline::standard(&taxonomy, &ChangelogConfig::default()).unwrap();
        let names: Vec<_> = pipeline.passes().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["fixup", "overrides", "manifest", "final"]);
    }

    #[test]
    fn test_skip_marker_excludes_commit_everywhere() {
        let (_, changelog, report) = run(&[
            commit("aaaa0001", "[FEATURE] Add thing", "[SKIP]", &["overrides/a.cfg"]),
            commit("aaaa0002", "[BUG] Fix thing", "[SKIP]", &["src/a.rs"]),
        ]);

        assert!(changelog.is_empty());
        assert_eq!(report.states, [CommitState::Unclaimed, CommitState::Unclaimed]);
        assert!(report.commit_log.is_empty());
    }

    #[test]
    fn test_marker_routes_to_bucket() {
        let (taxonomy, changelog, report) = run(&[commit(
            "aaaa0001",
            "Buff dragon [BALANCING][HM] increase damage",
            "",
            &["kubejs/dragon.js"],
        )]);

        let slot = taxonomy.slot("Balancing Changes", "Hard Mode").unwrap();
        assert_eq!(texts(&changelog, slot), ["Buff dragon increase damage"]);
        assert_eq!(report.states, [CommitState::ClaimedWithEntry]);
    }

    #[test]
    fn test_expand_list_becomes_sub_messages() {
        let (taxonomy, changelog, _) = run(&[commit(
            "aaaa0001",
            "[FEATURE] Add machines",
            "[EXPAND]\nmessages\nline one\nline two",
            &[],
        )]);

        let slot = taxonomy.slot("Feature Additions", "Both Modes").unwrap();
        let entries = changelog.entries(slot);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sub_messages, ["line one", "line two"]);
        assert_eq!(entries[0].commits, ["aaaa0001"]);
    }

    #[test]
    fn test_overrides_leftover_goes_to_general_other() {
        let (taxonomy, changelog, report) = run(&[
            commit("aaaa0001", "Tweak configs", "", &["overrides/config/a.cfg"]),
            commit("aaaa0002", "Move ores [NO CATEGORY]", "", &["overrides/ores.cfg"]),
        ]);

        let slot = taxonomy.slot("General Changes", "Other").unwrap();
        assert_eq!(texts(&changelog, slot), ["Tweak configs", "Move ores"]);
        assert_eq!(report.claimed(), 2);
    }

    #[test]
    fn test_claimed_commit_not_seen_by_later_passes() {
        // touches both scopes and carries a category: exactly one entry
        let (taxonomy, changelog, report) = run(&[commit(
            "aaaa0001",
            "[FEATURE] New recipes",
            "",
            &["overrides/recipes.js", "manifest.json"],
        )]);

        assert_eq!(changelog.len(), 1);
        let slot = taxonomy.slot("Feature Additions", "Both Modes").unwrap();
        assert_eq!(texts(&changelog, slot), ["New recipes"]);
        assert_eq!(report.states, [CommitState::ClaimedWithEntry]);
    }

    #[test]
    fn test_manifest_pass_leaves_unmatched_for_later_passes() {
        let (taxonomy, changelog, report) = run(&[
            commit("aaaa0001", "Update mods", "", &["manifest.json"]),
            commit("aaaa0002", "[GENERAL] Bump Foo", "", &["manifest.json"]),
        ]);

        let slot = taxonomy.slot("General Changes", "Other").unwrap();
        assert_eq!(texts(&changelog, slot), ["Bump Foo"]);
        assert_eq!(
            report.states,
            [CommitState::Unclaimed, CommitState::ClaimedWithEntry]
        );
    }

    #[test]
    fn test_terminal_drops_unmatched() {
        let (_, changelog, report) = run(&[
            commit("aaaa0001", "Refactor build", "", &["tools/build.ts"]),
            CommitInfo::new("aaaa0002", "No paths", "a", "a@b.c", Utc::now()),
        ]);

        assert!(changelog.is_empty());
        assert_eq!(report.states, [CommitState::Unclaimed, CommitState::Unclaimed]);
    }

    #[test]
    fn test_unknown_paths_are_out_of_scope() {
        let commit = CommitInfo::new("aaaa0001", "Tweak configs", "a", "a@b.c", Utc::now());
        let (_, changelog, _) = run(&[commit]);
        assert!(changelog.is_empty());
    }

    #[test]
    fn test_fix_up_round_trip() {
        let (taxonomy, changelog, report) = run(&[
            commit("abcd1234ffff", "[BUG] Fix crash", "", &["src/a.rs"]),
            commit("abcd5678ffff", "[BUG] Fix other crash", "", &["src/b.rs"]),
            commit(
                "ffff0000aaaa",
                "[FEATURE] Oops",
                "[FIXUP]\nfixes\nabcd1234 remove",
                &["overrides/a.cfg"],
            ),
        ]);

        assert!(!changelog.references("abcd1234ffff"));
        let slot = taxonomy.slot("Bug Fixes", "Both Modes").unwrap();
        assert_eq!(texts(&changelog, slot), ["Fix other crash"]);
        assert_eq!(report.states[2], CommitState::ClaimedWithoutEntry);
        assert!(report.warnings.is_empty());

        let logged: Vec<_> = report.commit_log.iter().map(|c| c.hash.as_str()).collect();
        assert_eq!(logged, ["abcd5678ffff"]);
    }

    #[test]
    fn test_fix_up_retitle_keeps_entry() {
        let (taxonomy, changelog, _) = run(&[
            commit("abcd1234ffff", "[QB] Add quests", "", &[]),
            commit(
                "ffff0000aaaa",
                "Fix changelog",
                "[FIXUP]\nabcd1234 retitle Add chapter 3 quests",
                &[],
            ),
        ]);

        let slot = taxonomy.slot("Quest Book Changes", "Both Modes").unwrap();
        assert_eq!(texts(&changelog, slot), ["Add chapter 3 quests"]);
    }

    #[test]
    fn test_fix_up_target_not_found_still_claimed() {
        let (_, changelog, report) = run(&[commit(
            "ffff0000aaaa",
            "[BUG] Fix changelog",
            "[FIXUP]\n1234abcd remove",
            &[],
        )]);

        assert!(changelog.is_empty());
        assert_eq!(report.states, [CommitState::ClaimedWithoutEntry]);
        assert_eq!(
            report.warnings,
            [Warning::FixUpTargetNotFound {
                commit: "ffff000".to_string(),
                target: "1234abcd".to_string(),
            }]
        );
    }

    #[test]
    fn test_fix_ups_recorded_newest_first() {
        let commits = [
            commit("abcd1234ffff", "[BUG] Fix crash", "", &[]),
            commit("eeee0001", "Older fix", "[FIXUP]\nabcd1234 retitle First", &[]),
            commit("eeee0002", "Newer fix", "[FIXUP]\nabcd1234 retitle Second", &[]),
        ];
        let (taxonomy, changelog, _) = run(&commits);

        // newest is recorded first, so the older retitle is applied last
        let slot = taxonomy.slot("Bug Fixes", "Both Modes").unwrap();
        assert_eq!(texts(&changelog, slot), ["First"]);
    }

    #[test]
    fn test_empty_message_warns() {
        let (_, changelog, report) = run(&[commit("aaaa0001", "[BUG]", "", &[])]);

        assert!(changelog.is_empty());
        assert_eq!(report.states, [CommitState::ClaimedWithoutEntry]);
        assert_eq!(
            report.warnings,
            [Warning::EmptyMessage {
                commit: "aaaa000".to_string(),
            }]
        );
    }

    #[test]
    fn test_custom_pipeline_without_commit_log() {
        let taxonomy = Taxonomy::standard().unwrap();
        let pipeline = Pipeline::new(vec![Pass::terminal("only").with_commit_log(false)]);
        let mut changelog = Changelog::new(&taxonomy);

        let report = pipeline.run(
            &taxonomy,
            &[commit("aaaa0001", "[BUG] Fix", "", &[])],
            &mut changelog,
        );

        assert_eq!(changelog.len(), 1);
        assert!(report.commit_log.is_empty());
    }
}

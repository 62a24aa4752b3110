//! Fix-up directives
//!
//! A fix-up commit corrects the changelog entry of an earlier commit without
//! rewriting history. Its body holds the `[FIXUP]` marker, an optional
//! `fixes` header, then one directive per line:
//!
//! ```text
//! [FIXUP]
//! fixes
//! 1a2b3c4 remove
//! 5d6e7f8 retitle Buff the dragon instead
//! 9a8b7c6 remove-message Added a second boss
//! ```

use modlog_git::CommitInfo;
use tracing::{debug, warn};

use crate::accumulator::Changelog;
use crate::markers::{directive_lines, FIXUP_LIST, FIXUP_MARKER};
use crate::types::{Warning, SHORT_HASH_LEN};

/// Shortest commit reference a directive may use
pub const MIN_REFERENCE_LEN: usize = 4;

/// What a fix-up does to its target's entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixUpAction {
    /// Drop every entry of the target commit
    Remove,
    /// Replace the text of the target commit's entries
    Retitle(String),
    /// Drop matching sub-messages or details from the target commit's entries
    RemoveMessage(String),
}

/// One parsed fix-up line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixUpDirective {
    /// Short hash of the commit carrying the directive
    pub source: String,
    /// Commit reference (hash prefix) of the target
    pub target: String,
    /// Requested change
    pub action: FixUpAction,
}

/// Parse the directives of a commit.
///
/// Returns `None` when the body has no fix-up marker. Lines that cannot be
/// understood become warnings and are otherwise ignored.
pub fn parse_directives(commit: &CommitInfo) -> Option<(Vec<FixUpDirective>, Vec<Warning>)> {
    let body = commit.body_text();
    if !body.contains(FIXUP_MARKER) {
        return None;
    }

    let mut directives = Vec::new();
    let mut warnings = Vec::new();

    for line in directive_lines(body, FIXUP_MARKER, FIXUP_LIST) {
        match parse_line(&line) {
            Ok((target, action)) => directives.push(FixUpDirective {
                source: commit.short_hash.clone(),
                target,
                action,
            }),
            Err(reason) => {
                warn!(commit = %commit.short_hash, line = %line, reason, "malformed fix-up directive");
                warnings.push(Warning::MalformedDirective {
                    commit: commit.short_hash.clone(),
                    line,
                    reason: reason.to_string(),
                });
            }
        }
    }

    if directives.is_empty() && warnings.is_empty() {
        warn!(commit = %commit.short_hash, "fix-up marker without directives");
        warnings.push(Warning::MalformedDirective {
            commit: commit.short_hash.clone(),
            line: FIXUP_MARKER.to_string(),
            reason: "no directives follow the marker".to_string(),
        });
    }

    Some((directives, warnings))
}

fn parse_line(line: &str) -> Result<(String, FixUpAction), &'static str> {
    let mut parts = line.splitn(3, char::is_whitespace);
    let target = parts.next().unwrap_or_default();
    let verb = parts.next().ok_or("missing action")?;
    let argument = parts.next().map(str::trim).unwrap_or_default();

    if target.len() < MIN_REFERENCE_LEN || !target.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("target is not a commit hash");
    }

    let action = match verb {
        "remove" if argument.is_empty() => FixUpAction::Remove,
        "remove" => return Err("remove takes no argument"),
        "retitle" | "remove-message" if argument.is_empty() => {
            return Err("action needs a message")
        }
        "retitle" => FixUpAction::Retitle(argument.to_string()),
        "remove-message" => FixUpAction::RemoveMessage(argument.to_string()),
        _ => return Err("unknown action"),
    };

    Ok((target.to_ascii_lowercase(), action))
}

/// Collects fix-up directives and applies them to a [`Changelog`]
#[derive(Debug, Default)]
pub struct FixUpResolver {
    pending: Vec<FixUpDirective>,
}

impl FixUpResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue directives in scan order
    pub fn record(&mut self, directives: impl IntoIterator<Item = FixUpDirective>) {
        self.pending.extend(directives);
    }

    /// Apply every queued directive once, in the order recorded.
    ///
    /// A directive that touches nothing yields a warning. So does one whose
    /// reference matches entries of several commits; it is not applied.
    pub fn apply(self, changelog: &mut Changelog) -> Vec<Warning> {
        let mut warnings = Vec::new();

        for directive in self.pending {
            let matches = changelog.matching_commits(&directive.target);
            if matches.len() > 1 {
                let candidates: Vec<String> = matches
                    .into_iter()
                    .map(|hash| hash.chars().take(SHORT_HASH_LEN).collect())
                    .collect();
                warn!(
                    commit = %directive.source,
                    target = %directive.target,
                    ?candidates,
                    "ambiguous fix-up target"
                );
                warnings.push(Warning::AmbiguousFixUpTarget {
                    commit: directive.source,
                    target: directive.target,
                    candidates,
                });
                continue;
            }

            let touched = match &directive.action {
                FixUpAction::Remove => changelog.remove_by_commit(&directive.target),
                FixUpAction::Retitle(text) => changelog.edit_by_commit(&directive.target, |entry| {
                    entry.text = text.clone();
                    true
                }),
                FixUpAction::RemoveMessage(text) => {
                    changelog.edit_by_commit(&directive.target, |entry| {
                        let before = entry.sub_messages.len() + entry.details.len();
                        entry.sub_messages.retain(|m| m != text);
                        entry.details.retain(|d| d != text);
                        entry.sub_messages.len() + entry.details.len() != before
                    })
                }
            };

            if touched == 0 {
                warn!(
                    commit = %directive.source,
                    target = %directive.target,
                    "fix-up target not found"
                );
                warnings.push(Warning::FixUpTargetNotFound {
                    commit: directive.source,
                    target: directive.target,
                });
            } else {
                debug!(
                    commit = %directive.source,
                    target = %directive.target,
                    touched,
                    "applied fix-up"
                );
            }
        }

        warnings
    }
}

//! Markdown changelog formatter

use modlog_core::config::ChangelogConfig;
use tracing::{debug, instrument};

use super::ChangelogFormatter;
use crate::types::{ChangelogDocument, ChangelogEntry, CommitSummary, SHORT_HASH_LEN};

/// Markdown changelog formatter.
///
/// Commit hashes link to the repository when `repo_url` is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Create a new markdown formatter
    pub fn new() -> Self {
        Self
    }

    fn commit_ref(&self, hash: &str, config: &ChangelogConfig) -> String {
        let short_hash = &hash[..SHORT_HASH_LEN.min(hash.len())];
        match config.repo_url.as_deref() {
            Some(repo_url) => format!(
                "[`{}`]({}/commit/{})",
                short_hash,
                repo_url.trim_end_matches('/'),
                hash
            ),
            None => format!("`{}`", short_hash),
        }
    }

    fn push_entry(&self, output: &mut String, entry: &ChangelogEntry, config: &ChangelogConfig) {
        output.push_str(&format!("* {}", entry.text));

        if config.include_hashes && !entry.commits.is_empty() {
            let refs: Vec<String> = entry
                .commits
                .iter()
                .map(|h| self.commit_ref(h, config))
                .collect();
            output.push_str(&format!(" ({})", refs.join(", ")));
        }
        output.push('\n');

        for message in &entry.sub_messages {
            output.push_str(&format!("  * {}\n", message));
        }

        if !entry.details.is_empty() {
            output.push_str("  * Details:\n");
            for detail in &entry.details {
                output.push_str(&format!("    * {}\n", detail));
            }
        }
    }

    fn push_commit(&self, output: &mut String, commit: &CommitSummary, config: &ChangelogConfig) {
        output.push_str(&format!(
            "* [{}] {} ({})\n",
            self.commit_ref(&commit.hash, config),
            commit.message,
            commit.author
        ));
    }
}

impl ChangelogFormatter for MarkdownFormatter {
    #[instrument(skip_all, fields(title = %document.title, section_count = document.sections.len()))]
    fn format(&self, document: &ChangelogDocument, config: &ChangelogConfig) -> String {
        let mut output = format!("# {}\n\n", document.title);

        if document.is_empty() {
            output.push_str("No changes.\n\n");
        }

        for section in &document.sections {
            output.push_str(&format!("## {}\n\n", section.title));

            for sub_section in &section.sub_sections {
                if !sub_section.title.is_empty() {
                    output.push_str(&format!("### {}\n\n", sub_section.title));
                }
                for entry in &sub_section.entries {
                    self.push_entry(&mut output, entry, config);
                }
                output.push('\n');
            }
        }

        if !document.commits.is_empty() {
            output.push_str("## Commits\n\n");
            for commit in &document.commits {
                self.push_commit(&mut output, commit, config);
            }
            output.push('\n');
        }

        debug!(output_len = output.len(), "markdown changelog formatted");
        output
    }
}

//! Changelog formatters

mod markdown;

pub use markdown::MarkdownFormatter;

use modlog_core::config::ChangelogConfig;

use crate::types::ChangelogDocument;

/// Trait for changelog formatters
pub trait ChangelogFormatter: Send + Sync {
    /// Render a changelog document to a string
    fn format(&self, document: &ChangelogDocument, config: &ChangelogConfig) -> String;
}

//! Modlog Changelog - Marker-driven changelog classification
//!
//! Commits are fed through an ordered pipeline of passes that classify them
//! into a fixed category taxonomy by bracketed marker tokens. Later commits
//! may fix up earlier entries, and mod changes from a manifest diff are
//! allocated to fixed buckets.

pub mod accumulator;
pub mod fixup;
pub mod formatter;
pub mod generator;
pub mod markers;
pub mod mods;
pub mod pipeline;
pub mod taxonomy;
pub mod types;

use modlog_core::error::ChangelogError;

/// Result type for changelog operations
pub type Result<T> = std::result::Result<T, ChangelogError>;

pub use accumulator::Changelog;
pub use fixup::{FixUpAction, FixUpDirective, FixUpResolver};
pub use formatter::{ChangelogFormatter, MarkdownFormatter};
pub use generator::{ChangelogGenerator, GeneratedChangelog};
pub use markers::{Classification, MarkerParser, ParsedMessage};
pub use mods::{ModChange, ModChangeAllocator, ModChangeKind, ModManifest};
pub use pipeline::{CommitState, Pass, PassKind, Pipeline, PipelineReport};
pub use taxonomy::{Category, SlotId, SubCategory, Taxonomy};
pub use types::{ChangelogDocument, ChangelogEntry, CommitSummary, Section, SubSection, Warning};

//! Changelog accumulator
//!
//! Mutable store of entries keyed by taxonomy bucket. Passes append to it;
//! fix-ups reach back into it by commit reference.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::debug;

use crate::taxonomy::{SlotId, Taxonomy};
use crate::types::{ChangelogDocument, ChangelogEntry, CommitSummary, Section, SubSection};

/// Entries grouped by (category, sub-category)
#[derive(Debug, Clone)]
pub struct Changelog {
    buckets: Vec<Vec<Vec<ChangelogEntry>>>,
}

impl Changelog {
    /// Create an empty changelog shaped like `taxonomy`
    pub fn new(taxonomy: &Taxonomy) -> Self {
        Self {
            buckets: taxonomy.shape().map(|subs| vec![Vec::new(); subs]).collect(),
        }
    }

    /// Append an entry to a bucket
    pub fn push(&mut self, slot: SlotId, entry: ChangelogEntry) {
        self.buckets[slot.category][slot.sub_category].push(entry);
    }

    /// Entries of a bucket in insertion order
    pub fn entries(&self, slot: SlotId) -> &[ChangelogEntry] {
        &self.buckets[slot.category][slot.sub_category]
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.iter_entries().count()
    }

    /// Check if there are no entries
    pub fn is_empty(&self) -> bool {
        self.iter_entries().next().is_none()
    }

    /// Whether any entry is attributed to the referenced commit
    pub fn references(&self, reference: &str) -> bool {
        self.iter_entries().any(|entry| entry.references(reference))
    }

    /// Distinct source commits of all entries whose hash starts with `reference`
    pub fn matching_commits(&self, reference: &str) -> BTreeSet<&str> {
        if reference.is_empty() {
            return BTreeSet::new();
        }
        self.iter_entries()
            .flat_map(|entry| &entry.commits)
            .filter(|hash| hash.starts_with(reference))
            .map(String::as_str)
            .collect()
    }

    /// Remove every entry attributed to the referenced commit.
    ///
    /// Returns the number of entries removed.
    pub fn remove_by_commit(&mut self, reference: &str) -> usize {
        let mut removed = 0;
        for entries in self.buckets.iter_mut().flatten() {
            let before = entries.len();
            entries.retain(|entry| !entry.references(reference));
            removed += before - entries.len();
        }
        debug!(reference, removed, "removed entries by commit");
        removed
    }

    /// Apply `edit` to every entry attributed to the referenced commit.
    ///
    /// `edit` reports whether it changed the entry; returns how many did.
    pub fn edit_by_commit<F>(&mut self, reference: &str, mut edit: F) -> usize
    where
        F: FnMut(&mut ChangelogEntry) -> bool,
    {
        let mut edited = 0;
        for entry in self
            .buckets
            .iter_mut()
            .flatten()
            .flatten()
            .filter(|entry| entry.references(reference))
        {
            if edit(entry) {
                edited += 1;
            }
        }
        debug!(reference, edited, "edited entries by commit");
        edited
    }

    /// Turn the buckets into a document, dropping empty buckets and
    /// categories and keeping taxonomy order.
    pub fn into_document(
        self,
        taxonomy: &Taxonomy,
        title: impl Into<String>,
        commits: Vec<CommitSummary>,
    ) -> ChangelogDocument {
        let sections = taxonomy
            .categories()
            .iter()
            .zip(self.buckets)
            .filter_map(|(category, buckets)| {
                let sub_sections: Vec<SubSection> = category
                    .sub_categories
                    .iter()
                    .zip(buckets)
                    .filter(|(_, entries)| !entries.is_empty())
                    .map(|(sub, entries)| SubSection {
                        title: sub.name.clone(),
                        entries,
                    })
                    .collect();

                (!sub_sections.is_empty()).then(|| Section {
                    title: category.name.clone(),
                    sub_sections,
                })
            })
            .collect();

        ChangelogDocument {
            title: title.into(),
            date: Utc::now(),
            sections,
            commits,
        }
    }

    fn iter_entries(&self) -> impl Iterator<Item = &ChangelogEntry> {
        self.buckets.iter().flatten().flatten()
    }
}

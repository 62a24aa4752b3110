//! Category taxonomy
//!
//! The taxonomy is the fixed shape of the changelog: an ordered list of
//! categories, each with an ordered list of sub-categories. Declaration order
//! is both the output order and the marker priority.

use std::collections::HashSet;

use modlog_core::error::ChangelogError;
use tracing::debug;

use crate::markers::DIRECTIVE_MARKERS;
use crate::Result;

/// Breaking changes category marker
pub const BREAKING_MARKER: &str = "[BREAKING]";
/// Balancing changes category marker
pub const BALANCING_MARKER: &str = "[BALANCING]";
/// Performance category marker
pub const PERFORMANCE_MARKER: &str = "[PERFORMANCE]";
/// Feature additions category marker
pub const FEATURE_MARKER: &str = "[FEATURE]";
/// Quest book category marker
pub const QUEST_BOOK_MARKER: &str = "[QB]";
/// Bug fixes category marker
pub const BUG_MARKER: &str = "[BUG]";
/// General changes category marker
pub const GENERAL_MARKER: &str = "[GENERAL]";
/// Internal changes category marker
pub const INTERNAL_MARKER: &str = "[INTERNAL]";

/// Normal mode sub-category marker
pub const NORMAL_MODE_MARKER: &str = "[NM]";
/// Hard mode sub-category marker
pub const HARD_MODE_MARKER: &str = "[HM]";
/// Quality of life sub-category marker
pub const QOL_MARKER: &str = "[QOL]";

/// Name of the category holding mod changes and uncategorized commits
pub const GENERAL_CATEGORY: &str = "General Changes";
/// Fallback bucket of the general category
pub const OTHER_SUB_CATEGORY: &str = "Other";
/// Bucket for updated mods
pub const MOD_UPDATES_SUB_CATEGORY: &str = "Mod Updates";
/// Bucket for added mods
pub const MOD_ADDITIONS_SUB_CATEGORY: &str = "Mod Additions";
/// Bucket for removed mods
pub const MOD_REMOVALS_SUB_CATEGORY: &str = "Mod Removals";

/// A sub-category of a [`Category`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCategory {
    /// Marker token; `None` means the bucket is never matched by scanning
    pub marker: Option<String>,
    /// Display name, may be empty for an unnamed bucket
    pub name: String,
}

impl SubCategory {
    /// A sub-category selected by a marker token
    pub fn keyed(marker: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            marker: Some(marker.into()),
            name: name.into(),
        }
    }

    /// A sub-category reachable only as a default or by direct allocation
    pub fn unkeyed(name: impl Into<String>) -> Self {
        Self {
            marker: None,
            name: name.into(),
        }
    }
}

/// A changelog category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Marker token; `None` makes this the catch-all category
    pub marker: Option<String>,
    /// Display name
    pub name: String,
    /// Sub-categories in output and scan order
    pub sub_categories: Vec<SubCategory>,
    /// Name of the sub-category used when no sub-marker matches
    pub default_sub_category: String,
}

impl Category {
    /// Create a category
    pub fn new(
        marker: Option<&str>,
        name: impl Into<String>,
        sub_categories: Vec<SubCategory>,
        default_sub_category: impl Into<String>,
    ) -> Self {
        Self {
            marker: marker.map(str::to_string),
            name: name.into(),
            sub_categories,
            default_sub_category: default_sub_category.into(),
        }
    }
}

/// Address of one (category, sub-category) bucket in a [`Taxonomy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId {
    pub(crate) category: usize,
    pub(crate) sub_category: usize,
}

impl SlotId {
    /// Index of the category
    pub fn category(&self) -> usize {
        self.category
    }

    /// Index of the sub-category within its category
    pub fn sub_category(&self) -> usize {
        self.sub_category
    }
}

/// Validated, immutable category table
#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: Vec<Category>,
    defaults: Vec<usize>,
    catch_all: Option<usize>,
}

impl Taxonomy {
    /// Build a taxonomy, checking every structural invariant
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        if categories.is_empty() {
            return Err(invalid("at least one category is required"));
        }

        let (defaults, catch_all) = validate_categories(&categories)?;

        debug!(categories = categories.len(), "taxonomy validated");
        Ok(Self {
            categories,
            defaults,
            catch_all,
        })
    }

    /// The built-in modpack taxonomy
    pub fn standard() -> Result<Self> {
        let normal_mode = SubCategory::keyed(NORMAL_MODE_MARKER, "Normal Mode");
        let hard_mode = SubCategory::keyed(HARD_MODE_MARKER, "Hard Mode");
        let qol = SubCategory::keyed(QOL_MARKER, "Quality of Life");
        let both_modes = SubCategory::unkeyed("Both Modes");
        let unnamed = SubCategory::unkeyed("");

        let modes = || vec![both_modes.clone(), normal_mode.clone(), hard_mode.clone()];

        Self::new(vec![
            Category::new(Some(BREAKING_MARKER), "Breaking Changes", vec![unnamed.clone()], ""),
            Category::new(Some(BALANCING_MARKER), "Balancing Changes", modes(), "Both Modes"),
            Category::new(
                Some(PERFORMANCE_MARKER),
                "Performance Improvements",
                vec![unnamed.clone()],
                "",
            ),
            Category::new(
                Some(FEATURE_MARKER),
                "Feature Additions",
                vec![qol, both_modes.clone(), normal_mode.clone(), hard_mode.clone()],
                "Both Modes",
            ),
            Category::new(Some(QUEST_BOOK_MARKER), "Quest Book Changes", modes(), "Both Modes"),
            Category::new(Some(BUG_MARKER), "Bug Fixes", modes(), "Both Modes"),
            Category::new(
                Some(GENERAL_MARKER),
                GENERAL_CATEGORY,
                vec![
                    SubCategory::unkeyed(MOD_UPDATES_SUB_CATEGORY),
                    SubCategory::unkeyed(MOD_ADDITIONS_SUB_CATEGORY),
                    SubCategory::unkeyed(MOD_REMOVALS_SUB_CATEGORY),
                    SubCategory::unkeyed(OTHER_SUB_CATEGORY),
                ],
                OTHER_SUB_CATEGORY,
            ),
            Category::new(Some(INTERNAL_MARKER), "Internal Changes", vec![unnamed], ""),
        ])
    }

    /// Categories in declaration order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category addressed by a slot
    pub fn category(&self, slot: SlotId) -> &Category {
        &self.categories[slot.category]
    }

    /// Sub-category addressed by a slot
    pub fn sub_category(&self, slot: SlotId) -> &SubCategory {
        &self.categories[slot.category].sub_categories[slot.sub_category]
    }

    /// Find the first category whose marker occurs in any of `sources`.
    ///
    /// Falls back to the catch-all category, if one is declared.
    pub fn match_category(&self, sources: &[&str]) -> Option<usize> {
        self.categories
            .iter()
            .position(|category| {
                category
                    .marker
                    .as_deref()
                    .is_some_and(|marker| sources.iter().any(|s| s.contains(marker)))
            })
            .or(self.catch_all)
    }

    /// Pick the bucket for a matched category: the first keyed sub-category
    /// whose marker occurs in `sources`, else the category's default.
    pub fn match_sub_category(&self, category: usize, sources: &[&str]) -> SlotId {
        let sub_category = self.categories[category]
            .sub_categories
            .iter()
            .position(|sub| {
                sub.marker
                    .as_deref()
                    .is_some_and(|marker| sources.iter().any(|s| s.contains(marker)))
            })
            .unwrap_or(self.defaults[category]);

        SlotId {
            category,
            sub_category,
        }
    }

    /// Look up a bucket by display names
    pub fn slot(&self, category: &str, sub_category: &str) -> Option<SlotId> {
        let category_index = self.categories.iter().position(|c| c.name == category)?;
        let sub_index = self.categories[category_index]
            .sub_categories
            .iter()
            .position(|s| s.name == sub_category)?;

        Some(SlotId {
            category: category_index,
            sub_category: sub_index,
        })
    }

    /// Look up a bucket by display names, failing if the taxonomy lacks it
    pub fn require_slot(&self, category: &str, sub_category: &str) -> Result<SlotId> {
        self.slot(category, sub_category).ok_or_else(|| {
            invalid(format!(
                "missing required bucket '{}' / '{}'",
                category, sub_category
            ))
        })
    }

    /// Every category and sub-category marker, for stripping from text
    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().flat_map(|category| {
            category.marker.as_deref().into_iter().chain(
                category
                    .sub_categories
                    .iter()
                    .filter_map(|sub| sub.marker.as_deref()),
            )
        })
    }

    /// Number of buckets per category, in order
    pub(crate) fn shape(&self) -> impl Iterator<Item = usize> + '_ {
        self.categories.iter().map(|c| c.sub_categories.len())
    }
}

/// Check category-level invariants and return each category's default
/// sub-category index plus the catch-all category, if any
fn validate_categories(categories: &[Category]) -> Result<(Vec<usize>, Option<usize>)> {
    let mut names = HashSet::new();
    let mut markers = HashSet::new();
    let mut defaults = Vec::with_capacity(categories.len());
    let mut catch_all = None;

    for (index, category) in categories.iter().enumerate() {
        if !names.insert(category.name.as_str()) {
            return Err(invalid(format!("duplicate category '{}'", category.name)));
        }

        match category.marker.as_deref() {
            Some(marker) => {
                check_marker(marker, &category.name)?;
                if !markers.insert(marker) {
                    return Err(invalid(format!("marker {} is used twice", marker)));
                }
            }
            None if catch_all.is_some() => {
                return Err(invalid("only one category may omit its marker"));
            }
            None => catch_all = Some(index),
        }

        defaults.push(validate_sub_categories(category)?);
    }

    Ok((defaults, catch_all))
}

/// Check one category's sub-categories and return the default's index
fn validate_sub_categories(category: &Category) -> Result<usize> {
    if category.sub_categories.is_empty() {
        return Err(invalid(format!(
            "category '{}' has no sub-categories",
            category.name
        )));
    }

    let mut names = HashSet::new();
    let mut markers = HashSet::new();
    for sub in &category.sub_categories {
        if !names.insert(sub.name.as_str()) {
            return Err(invalid(format!(
                "category '{}' declares sub-category '{}' twice",
                category.name, sub.name
            )));
        }
        if let Some(marker) = sub.marker.as_deref() {
            check_marker(marker, &category.name)?;
            if !markers.insert(marker) {
                return Err(invalid(format!(
                    "category '{}' uses sub-marker {} twice",
                    category.name, marker
                )));
            }
        }
    }

    category
        .sub_categories
        .iter()
        .position(|sub| sub.name == category.default_sub_category)
        .ok_or_else(|| {
            invalid(format!(
                "default sub-category '{}' is not a member of '{}'",
                category.default_sub_category, category.name
            ))
        })
}

fn check_marker(marker: &str, owner: &str) -> Result<()> {
    if marker.is_empty() {
        return Err(invalid(format!("'{}' has an empty marker", owner)));
    }
    if DIRECTIVE_MARKERS.contains(&marker) {
        return Err(invalid(format!(
            "'{}' uses reserved directive marker {}",
            owner, marker
        )));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> ChangelogError {
    ChangelogError::InvalidTaxonomy(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> Taxonomy {
        Taxonomy::standard().unwrap()
    }

    #[test]
    fn test_standard_taxonomy_order() {
        let taxonomy = standard();
        let names: Vec<_> = taxonomy.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Breaking Changes",
                "Balancing Changes",
                "Performance Improvements",
                "Feature Additions",
                "Quest Book Changes",
                "Bug Fixes",
                "General Changes",
                "Internal Changes",
            ]
        );
    }

    #[test]
    fn test_first_category_in_declaration_order_wins() {
        let taxonomy = standard();
        // [BUG] appears first in the text but [FEATURE] is declared earlier
        let index = taxonomy.match_category(&["[BUG] [FEATURE] thing", ""]).unwrap();
        assert_eq!(taxonomy.categories()[index].name, "Feature Additions");
    }

    #[test]
    fn test_marker_match_is_case_sensitive() {
        let taxonomy = standard();
        assert!(taxonomy.match_category(&["[feature] lower case"]).is_none());
    }

    #[test]
    fn test_category_marker_found_in_body() {
        let taxonomy = standard();
        let index = taxonomy.match_category(&["Fix crash", "[BUG]"]).unwrap();
        assert_eq!(taxonomy.categories()[index].name, "Bug Fixes");
    }

    #[test]
    fn test_sub_category_default() {
        let taxonomy = standard();
        let index = taxonomy.match_category(&["[BALANCING] tweak"]).unwrap();
        let slot = taxonomy.match_sub_category(index, &["[BALANCING] tweak"]);
        assert_eq!(taxonomy.sub_category(slot).name, "Both Modes");
    }

    #[test]
    fn test_sub_category_marker() {
        let taxonomy = standard();
        let text = ["[FEATURE][HM] new boss"];
        let index = taxonomy.match_category(&text).unwrap();
        let slot = taxonomy.match_sub_category(index, &text);
        assert_eq!(taxonomy.sub_category(slot).name, "Hard Mode");
    }

    #[test]
    fn test_unkeyed_sub_categories_never_match() {
        let taxonomy = standard();
        let text = ["[GENERAL] Mod Updates Other"];
        let index = taxonomy.match_category(&text).unwrap();
        let slot = taxonomy.match_sub_category(index, &text);
        assert_eq!(taxonomy.sub_category(slot).name, "Other");
    }

    #[test]
    fn test_slot_lookup() {
        let taxonomy = standard();
        let slot = taxonomy.slot("General Changes", "Mod Updates").unwrap();
        assert_eq!(slot.category(), 6);
        assert_eq!(slot.sub_category(), 0);
        assert!(taxonomy.slot("General Changes", "Hard Mode").is_none());
        assert!(taxonomy.require_slot("Nope", "Other").is_err());
    }

    #[test]
    fn test_default_must_be_member() {
        let result = Taxonomy::new(vec![Category::new(
            Some("[X]"),
            "X",
            vec![SubCategory::unkeyed("A")],
            "B",
        )]);
        assert!(matches!(result, Err(ChangelogError::InvalidTaxonomy(_))));
    }

    #[test]
    fn test_duplicate_markers_rejected() {
        let result = Taxonomy::new(vec![
            Category::new(Some("[X]"), "X", vec![SubCategory::unkeyed("")], ""),
            Category::new(Some("[X]"), "Y", vec![SubCategory::unkeyed("")], ""),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_directive_marker_reserved() {
        let result = Taxonomy::new(vec![Category::new(
            Some("[SKIP]"),
            "X",
            vec![SubCategory::unkeyed("")],
            "",
        )]);
        assert!(result.is_err());
    }

    #[test]
    fn test_catch_all_category() {
        let taxonomy = Taxonomy::new(vec![
            Category::new(Some("[X]"), "X", vec![SubCategory::unkeyed("")], ""),
            Category::new(None, "Everything Else", vec![SubCategory::unkeyed("")], ""),
        ])
        .unwrap();

        assert_eq!(taxonomy.match_category(&["[X] thing"]), Some(0));
        assert_eq!(taxonomy.match_category(&["plain"]), Some(1));
    }

    #[test]
    fn test_two_catch_alls_rejected() {
        let result = Taxonomy::new(vec![
            Category::new(None, "A", vec![SubCategory::unkeyed("")], ""),
            Category::new(None, "B", vec![SubCategory::unkeyed("")], ""),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_markers_vocabulary() {
        let taxonomy = standard();
        let markers: Vec<_> = taxonomy.markers().collect();
        assert!(markers.contains(&"[FEATURE]"));
        assert!(markers.contains(&"[QOL]"));
        assert!(markers.contains(&"[HM]"));
    }
}

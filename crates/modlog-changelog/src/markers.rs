//! Marker parsing
//!
//! Commit authors steer the changelog with bracketed marker tokens in the
//! subject or body. These literals are a compatibility surface: every
//! historical commit message depends on them.

use crate::taxonomy::{SlotId, Taxonomy};

/// Body marker that keeps a commit out of the changelog
pub const SKIP_MARKER: &str = "[SKIP]";
/// Body marker introducing a list of additional messages
pub const EXPAND_MARKER: &str = "[EXPAND]";
/// Optional header line of the expand list
pub const EXPAND_LIST: &str = "messages";
/// Body marker introducing a list of details
pub const DETAILS_MARKER: &str = "[DETAILS]";
/// Optional header line of the details list
pub const DETAILS_LIST: &str = "details";
/// Marker routing a commit past category assignment
pub const NO_CATEGORY_MARKER: &str = "[NO CATEGORY]";
/// Body marker introducing fix-up directives
pub const FIXUP_MARKER: &str = "[FIXUP]";
/// Optional header line of the fix-up list
pub const FIXUP_LIST: &str = "fixes";

/// Markers with special handling; categories may not reuse them
pub const DIRECTIVE_MARKERS: [&str; 5] = [
    SKIP_MARKER,
    EXPAND_MARKER,
    DETAILS_MARKER,
    NO_CATEGORY_MARKER,
    FIXUP_MARKER,
];

/// Markers that open a line list in the body
const LIST_MARKERS: [&str; 3] = [EXPAND_MARKER, DETAILS_MARKER, FIXUP_MARKER];

/// Text extracted from a commit once markers are stripped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMessage {
    /// Subject with all markers removed and whitespace collapsed
    pub text: String,
    /// Lines of the expand list
    pub sub_messages: Vec<String>,
    /// Lines of the details list
    pub details: Vec<String>,
}

/// Result of classifying one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A category marker matched
    Categorized {
        /// Destination bucket
        slot: SlotId,
        /// Rendered text
        message: ParsedMessage,
    },
    /// The commit asked to bypass category assignment
    NoCategory(ParsedMessage),
    /// No category marker was found
    Unmatched(ParsedMessage),
}

impl Classification {
    /// The extracted text, whatever the outcome
    pub fn message(&self) -> &ParsedMessage {
        match self {
            Self::Categorized { message, .. } | Self::NoCategory(message) | Self::Unmatched(message) => {
                message
            }
        }
    }

    /// Consume into the extracted text
    pub fn into_message(self) -> ParsedMessage {
        match self {
            Self::Categorized { message, .. } | Self::NoCategory(message) | Self::Unmatched(message) => {
                message
            }
        }
    }
}

/// Whether a commit body asks for the commit to be skipped
pub fn has_skip_marker(body: &str) -> bool {
    body.contains(SKIP_MARKER)
}

/// Marker-driven classifier over a [`Taxonomy`]
pub struct MarkerParser<'t> {
    taxonomy: &'t Taxonomy,
}

impl<'t> MarkerParser<'t> {
    /// Create a parser for a taxonomy
    pub fn new(taxonomy: &'t Taxonomy) -> Self {
        Self { taxonomy }
    }

    /// Classify a commit by its subject and body.
    ///
    /// The no-category marker takes precedence over any category marker.
    /// Markers are looked up in the subject and in the body text before the
    /// first list; markers inside a list only get stripped from its lines.
    pub fn classify(&self, message: &str, body: &str) -> Classification {
        let sources = [message, body_head(body)];
        let parsed = ParsedMessage {
            text: self.strip_markers(message),
            sub_messages: self.list(body, EXPAND_MARKER, EXPAND_LIST),
            details: self.list(body, DETAILS_MARKER, DETAILS_LIST),
        };

        if sources.iter().any(|s| s.contains(NO_CATEGORY_MARKER)) {
            return Classification::NoCategory(parsed);
        }

        match self.taxonomy.match_category(&sources) {
            Some(category) => Classification::Categorized {
                slot: self.taxonomy.match_sub_category(category, &sources),
                message: parsed,
            },
            None => Classification::Unmatched(parsed),
        }
    }

    /// Remove every known marker token and collapse the leftover whitespace
    pub fn strip_markers(&self, text: &str) -> String {
        let mut stripped = text.to_string();
        for marker in self.taxonomy.markers().chain(DIRECTIVE_MARKERS) {
            if stripped.contains(marker) {
                stripped = stripped.replace(marker, " ");
            }
        }
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn list(&self, body: &str, marker: &str, header: &str) -> Vec<String> {
        directive_lines(body, marker, header)
            .iter()
            .map(|line| self.strip_markers(line))
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Body text before the first list marker
fn body_head(body: &str) -> &str {
    let end = LIST_MARKERS
        .iter()
        .filter_map(|marker| body.find(marker))
        .min()
        .unwrap_or(body.len());
    &body[..end]
}

/// Lines following `marker` in `body`, up to the next directive marker.
///
/// A first line equal to `header` is a list label and is dropped, as are
/// blank lines and leading `-`/`*` bullets. Returns nothing when the marker
/// is absent.
pub fn directive_lines(body: &str, marker: &str, header: &str) -> Vec<String> {
    let Some(start) = body.find(marker) else {
        return Vec::new();
    };
    let rest = &body[start + marker.len()..];
    let end = DIRECTIVE_MARKERS
        .iter()
        .filter_map(|other| rest.find(other))
        .min()
        .unwrap_or(rest.len());

    let mut lines: Vec<String> = rest[..end]
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .unwrap_or(line)
                .trim()
                .to_string()
        })
        .collect();

    if lines.first().is_some_and(|first| first == header) {
        lines.remove(0);
    }
    lines
}

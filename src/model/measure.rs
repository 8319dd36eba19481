//! Calculated-measure definitions and their usage state.

use crate::model::page::PageKey;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

/// An `Entity[Name]` or `'Entity'[Name]` reference inside an expression.
/// The bracketed part admits Greek letters, which appear in statistical
/// measure names.
static MEASURE_REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[a-zA-Z0-9_ '"]+\[[a-zA-ZΑ-Ωα-ω0-9_ &]*\]"#).unwrap());

/// The documentation comment convention: a block comment carrying at
/// least an `Author:` field.
static COMMENT_BLOCK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*? Author:.*?\*/").unwrap());

static AUTHOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Author: ([a-zA-Z ]*)").unwrap());

static DESCRIPTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Description: ([a-zA-Z0-9 .\-"]*)"#).unwrap());

static LAST_CHANGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Last change: ([0-9./-]*)").unwrap());

/// Usage status of a measure, resolved by the report builder.
///
/// Transitions are monotonic: `Unreferenced` is the only state that ever
/// changes, and `DirectlyUsed` wins over everything else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UsageState {
    /// Referenced by at least one page or visual.
    DirectlyUsed,
    /// Reachable from a directly used measure through the dependency
    /// graph, but not referenced by any visual itself.
    IndirectlyUsed,
    /// Not reachable from any visual and no incoming dependency edges.
    #[default]
    Unreferenced,
    /// Referenced only by measures that are themselves unused.
    Dangling,
}

impl UsageState {
    /// Stable label used in exported records.
    pub fn label(&self) -> &'static str {
        match self {
            UsageState::DirectlyUsed => "Directly Used",
            UsageState::IndirectlyUsed => "Indirectly Used",
            UsageState::Unreferenced => "Unreferenced",
            UsageState::Dangling => "Dangling",
        }
    }
}

impl fmt::Display for UsageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single calculated measure.
///
/// Identity is the (entity name, name) pair; the derived
/// [`full_name`](Measure::full_name) is the canonical lookup key within a
/// report. Dependency and usage links are stored as keys (full names and
/// page keys), never as owning pointers.
#[derive(Debug, Clone)]
pub struct Measure {
    pub name: String,

    /// Name of the table the measure belongs to.
    pub entity_name: String,

    /// The raw expression text.
    pub expression: String,

    /// Parsed from the comment convention, or back-filled later.
    pub author: Option<String>,
    pub description: Option<String>,
    pub last_change: Option<String>,

    pub usage_state: UsageState,

    /// Raw `Entity[Name]` strings this measure's expression references.
    /// Not guaranteed to resolve to measures of this report.
    pub referenced_measures: BTreeSet<String>,

    /// Full names of measures whose expressions reference this one.
    /// Populated by the report's dependency resolution.
    pub referenced_by: BTreeSet<String>,

    /// Keys of pages that use this measure directly.
    pub used_in_pages: BTreeSet<PageKey>,
}

impl Measure {
    pub fn new(
        name: impl Into<String>,
        entity_name: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entity_name: entity_name.into(),
            expression: expression.into(),
            author: None,
            description: None,
            last_change: None,
            usage_state: UsageState::default(),
            referenced_measures: BTreeSet::new(),
            referenced_by: BTreeSet::new(),
            used_in_pages: BTreeSet::new(),
        }
    }

    /// The canonical `Entity[Name]` key.
    pub fn full_name(&self) -> String {
        format!("{}[{}]", self.entity_name, self.name)
    }
}

impl PartialEq for Measure {
    fn eq(&self, other: &Self) -> bool {
        self.entity_name == other.entity_name && self.name == other.name
    }
}

impl Eq for Measure {}

impl std::hash::Hash for Measure {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.entity_name.hash(state);
        self.name.hash(state);
    }
}

/// Author/description/last-change fields parsed from a documentation
/// comment embedded in an expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentMetadata {
    pub author: Option<String>,
    pub description: Option<String>,
    pub last_change: Option<String>,
}

/// Parse the documentation comment convention out of an expression.
///
/// The convention is a block comment of the form
///
/// ```text
/// /*
/// * Author: Jane Doe
/// * Description: Sales per month
/// * Last change: 2025/10/23
/// */
/// ```
///
/// Each field is optional and extracted independently; expressions without
/// such a comment yield empty metadata.
pub(crate) fn parse_comment_metadata(expression: &str) -> CommentMetadata {
    let Some(comment) = COMMENT_BLOCK_PATTERN
        .find(expression)
        .map(|found| found.as_str())
    else {
        return CommentMetadata::default();
    };

    let capture = |pattern: &Regex| {
        pattern
            .captures(comment)
            .and_then(|captures| captures.get(1))
            .map(|group| group.as_str().to_string())
    };

    CommentMetadata {
        author: capture(&AUTHOR_PATTERN),
        description: capture(&DESCRIPTION_PATTERN),
        last_change: capture(&LAST_CHANGE_PATTERN),
    }
}

/// Collect every `Entity[Name]` style reference in an expression,
/// whitespace-trimmed.
pub(crate) fn extract_measure_refs(expression: &str) -> BTreeSet<String> {
    MEASURE_REF_PATTERN
        .find_iter(expression)
        .map(|found| found.as_str().trim().to_string())
        .collect()
}

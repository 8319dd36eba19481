//! A single page ("section") of a report.

use crate::extract::find_field_refs;
use crate::layout::{decode_embedded, LayoutResult, SectionRecord};
use crate::model::{Diagnostic, Visual};
use serde_json::Value;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

/// Identity of a page: its ordinal and display name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageKey {
    pub ordinal: Option<i64>,
    pub name: String,
}

/// One section of a report, owning its visuals in document order.
#[derive(Debug, Clone)]
pub struct Page {
    /// Internal section identifier.
    pub id: String,

    /// Display name shown to report readers.
    pub name: String,

    /// Position of the page within the report.
    pub ordinal: Option<i64>,

    pub width: Option<f64>,
    pub height: Option<f64>,

    /// Whether the page is visible to readers.
    pub is_visible: bool,

    /// Decoded page configuration. Opaque.
    pub config: Value,

    /// Decoded page-level filters.
    pub filters: Vec<Value>,

    pub visuals: Vec<Visual>,

    /// Every field referenced on this page, in `Entity[Property]` form.
    pub used_fields: BTreeSet<String>,

    /// Full names of measures used on this page. Populated by the
    /// report's usage resolution, not at page construction.
    pub used_measures: BTreeSet<String>,

    /// Non-empty visual titles, in document order.
    pub visual_titles: Vec<String>,

    /// Back-filled by an external collaborator, if at all.
    pub description: Option<String>,
}

impl Page {
    pub(crate) fn from_section(
        section: &SectionRecord,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> LayoutResult<Self> {
        let config: Value = decode_embedded(section.config.as_deref(), "page config")?;
        let filters: Vec<Value> = decode_embedded(section.filters.as_deref(), "page filters")?;

        let name = section
            .display_name
            .clone()
            .unwrap_or_else(|| "Untitled Page".to_string());

        let mut visuals = Vec::with_capacity(section.visual_containers.len());
        for container in &section.visual_containers {
            visuals.push(Visual::from_container(container)?);
        }

        // Union of every visual's references plus the page's own filters,
        // still in raw Entity.Property form at this point.
        let mut raw_fields = BTreeSet::new();
        for visual in &visuals {
            raw_fields.extend(visual.used_fields.iter().cloned());
        }
        for filter in &filters {
            raw_fields.extend(find_field_refs(filter));
        }

        let used_fields = reformat_used_fields(raw_fields, &name, diagnostics);

        let visual_titles = visuals
            .iter()
            .filter_map(|visual| visual.title.clone())
            .filter(|title| !title.is_empty())
            .collect();

        Ok(Self {
            id: section.name.clone(),
            name,
            ordinal: section.ordinal,
            width: section.width,
            height: section.height,
            is_visible: section.display_option == Some(1),
            config,
            filters,
            visuals,
            used_fields,
            used_measures: BTreeSet::new(),
            visual_titles,
            description: None,
        })
    }

    /// The page's identity key.
    pub fn key(&self) -> PageKey {
        PageKey {
            ordinal: self.ordinal,
            name: self.name.clone(),
        }
    }
}

// Two pages with the same (ordinal, name) pair are the same page.
impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.ordinal == other.ordinal && self.name == other.name
    }
}

impl Eq for Page {}

impl Hash for Page {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ordinal.hash(state);
        self.name.hash(state);
    }
}

/// Convert `Entity.Property` references to the `Entity[Property]` form
/// used as measure keys, splitting on the first `.`.
///
/// References without a separator cannot be reformatted; they are dropped
/// with a diagnostic rather than failing the page.
fn reformat_used_fields(
    raw_fields: BTreeSet<String>,
    page_name: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> BTreeSet<String> {
    let mut reformatted = BTreeSet::new();
    for field in raw_fields {
        match field.split_once('.') {
            Some((entity, property)) => {
                reformatted.insert(format!("{entity}[{property}]"));
            }
            None => diagnostics.push(Diagnostic::MalformedFieldRef {
                page: page_name.to_string(),
                field,
            }),
        }
    }
    reformatted
}

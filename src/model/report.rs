//! Report construction: page loading, measure loading, dependency
//! resolution and usage propagation.

use crate::layout::{
    decode_embedded, LayoutConfig, LayoutDocument, LayoutError, LayoutResult,
};
use crate::model::measure::{extract_measure_refs, parse_comment_metadata};
use crate::model::{Diagnostic, Measure, MeasureGraph, Page, UsageState};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Policy for two measure definitions resolving to the same full name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Keep the later definition and record a diagnostic.
    #[default]
    LastWriteWins,
    /// Fail construction of the report.
    Reject,
}

/// Construction options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub duplicate_measures: DuplicatePolicy,
}

/// A measure's name and expression, the input surface for an external
/// description generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeasureSummary {
    /// The measure's full name.
    pub name: String,
    pub expression: String,
}

/// One parsed report: pages, measures and the dependency graph between
/// them. Construction resolves every measure's usage state; afterwards
/// the structure is read-only except for back-filled descriptions.
#[derive(Debug, Clone)]
pub struct Report {
    pub name: String,

    /// Numeric document id, when the layout carries one.
    pub id: Option<i64>,

    /// Pages in document order.
    pub pages: Vec<Page>,

    /// Measures keyed by full name (`Entity[Name]`).
    pub measures: BTreeMap<String, Measure>,

    /// Report-level filters. Opaque.
    pub global_filters: Vec<Value>,

    /// Bookmark definitions. Opaque.
    pub bookmarks: Vec<Value>,

    /// Non-fatal conditions collected during construction.
    pub diagnostics: Vec<Diagnostic>,

    graph: MeasureGraph,
}

impl Report {
    /// Build a report from a decoded layout document tree.
    pub fn from_value(name: impl Into<String>, layout: Value) -> LayoutResult<Self> {
        Self::from_value_with_options(name, layout, ReportOptions::default())
    }

    pub fn from_value_with_options(
        name: impl Into<String>,
        layout: Value,
        options: ReportOptions,
    ) -> LayoutResult<Self> {
        let document: LayoutDocument = serde_json::from_value(layout)?;
        Self::from_layout_with_options(name, &document, options)
    }

    /// Build a report from an already-typed layout document.
    pub fn from_layout(name: impl Into<String>, layout: &LayoutDocument) -> LayoutResult<Self> {
        Self::from_layout_with_options(name, layout, ReportOptions::default())
    }

    pub fn from_layout_with_options(
        name: impl Into<String>,
        layout: &LayoutDocument,
        options: ReportOptions,
    ) -> LayoutResult<Self> {
        let mut diagnostics = Vec::new();

        let config: LayoutConfig = decode_embedded(layout.config.as_deref(), "report config")?;
        let global_filters: Vec<Value> =
            decode_embedded(layout.filters.as_deref(), "report filters")?;

        let mut pages = Vec::with_capacity(layout.sections.len());
        for section in &layout.sections {
            pages.push(Page::from_section(section, &mut diagnostics)?);
        }

        let measures = load_measures(&config, options, &mut diagnostics)?;

        let mut report = Self {
            name: name.into(),
            id: layout.id,
            pages,
            measures,
            global_filters,
            bookmarks: config.bookmarks,
            diagnostics,
            graph: MeasureGraph::default(),
        };

        report.resolve_measure_dependencies();
        report.resolve_page_usage();
        report.propagate_indirect_usage();
        report.classify_dangling_measures();

        Ok(report)
    }

    /// The measure dependency graph.
    pub fn graph(&self) -> &MeasureGraph {
        &self.graph
    }

    /// Look up a measure by its `Entity[Name]` key.
    pub fn measure(&self, full_name: &str) -> Option<&Measure> {
        self.measures.get(full_name)
    }

    /// Summaries of every measure with no description yet, the work list
    /// for an external description generator.
    pub fn measures_without_description(&self) -> Vec<MeasureSummary> {
        self.measures
            .values()
            .filter(|measure| measure.description.is_none())
            .map(|measure| MeasureSummary {
                name: measure.full_name(),
                expression: measure.expression.clone(),
            })
            .collect()
    }

    /// Back-fill measure descriptions from a full-name → description
    /// mapping. Returns the number of measures updated.
    pub fn apply_measure_descriptions(&mut self, descriptions: &HashMap<String, String>) -> usize {
        let mut applied = 0;
        for (full_name, description) in descriptions {
            if let Some(measure) = self.measures.get_mut(full_name) {
                measure.description = Some(description.clone());
                applied += 1;
            }
        }
        applied
    }

    /// Back-fill page descriptions from a page-name → description
    /// mapping. Returns the number of pages updated.
    pub fn apply_page_descriptions(&mut self, descriptions: &HashMap<String, String>) -> usize {
        let mut applied = 0;
        for page in &mut self.pages {
            if let Some(description) = descriptions.get(&page.name) {
                page.description = Some(description.clone());
                applied += 1;
            }
        }
        applied
    }

    /// Build the dependency graph and mirror its edges into each
    /// measure's `referenced_by` set.
    fn resolve_measure_dependencies(&mut self) {
        let graph = MeasureGraph::build(&self.measures, &mut self.diagnostics);
        for (source, target) in graph.edges() {
            let (source, target) = (source.to_string(), target);
            if let Some(measure) = self.measures.get_mut(target) {
                measure.referenced_by.insert(source);
            }
        }
        self.graph = graph;
    }

    /// Link pages to the measures their used fields name. Runs before
    /// propagation, so a direct use always wins over graph inference.
    fn resolve_page_usage(&mut self) {
        let Self {
            pages, measures, ..
        } = self;
        for page in pages.iter_mut() {
            let key = page.key();
            for field in &page.used_fields {
                if let Some(measure) = measures.get_mut(field) {
                    page.used_measures.insert(field.clone());
                    measure.used_in_pages.insert(key.clone());
                    measure.usage_state = UsageState::DirectlyUsed;
                }
            }
        }
    }

    /// Walk the dependency graph from every directly used measure and
    /// mark reachable unreferenced measures as indirectly used.
    fn propagate_indirect_usage(&mut self) {
        let roots: Vec<String> = self
            .measures
            .iter()
            .filter(|(_, measure)| measure.usage_state == UsageState::DirectlyUsed)
            .map(|(full_name, _)| full_name.clone())
            .collect();

        // Nodes that already left Unreferenced are never revisited;
        // cycles terminate there. The visited set backstops that guard.
        let mut visited = HashSet::new();
        for root in roots {
            self.propagate_from(&root, &mut visited);
        }
    }

    fn propagate_from(&mut self, full_name: &str, visited: &mut HashSet<String>) {
        if !visited.insert(full_name.to_string()) {
            return;
        }
        let targets: Vec<String> = self
            .graph
            .dependencies_of(full_name)
            .into_iter()
            .map(str::to_string)
            .collect();
        for target in targets {
            let Some(measure) = self.measures.get_mut(&target) else {
                continue;
            };
            if measure.usage_state == UsageState::Unreferenced {
                measure.usage_state = UsageState::IndirectlyUsed;
                self.propagate_from(&target, visited);
            }
        }
    }

    /// Final pass: an unreferenced measure with incoming edges sits in a
    /// dead sub-graph.
    fn classify_dangling_measures(&mut self) {
        for measure in self.measures.values_mut() {
            if measure.usage_state == UsageState::Unreferenced && !measure.referenced_by.is_empty()
            {
                measure.usage_state = UsageState::Dangling;
            }
        }
    }
}

/// Load measures from the first model-extension entry.
///
/// No model extension means no measures, which is not an error. Each
/// definition is parsed for comment metadata and raw references; the
/// structured reference list, when present, is unioned in.
fn load_measures(
    config: &LayoutConfig,
    options: ReportOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> LayoutResult<BTreeMap<String, Measure>> {
    let mut measures = BTreeMap::new();
    let Some(extension) = config.model_extensions.first() else {
        return Ok(measures);
    };

    for entity in &extension.entities {
        let entity_name = entity.name.clone().unwrap_or_else(|| "Unknown".to_string());

        for definition in &entity.measures {
            let mut measure = Measure::new(
                definition.name.clone(),
                entity_name.clone(),
                definition.expression.clone(),
            );

            let metadata = parse_comment_metadata(&measure.expression);
            measure.author = metadata.author;
            measure.description = metadata.description;
            measure.last_change = metadata.last_change;

            let mut references = extract_measure_refs(&measure.expression);
            if let Some(block) = &definition.references {
                references.extend(
                    block
                        .measures
                        .iter()
                        .map(|reference| format!("{}[{}]", reference.entity, reference.name)),
                );
            }
            measure.referenced_measures = references;

            let full_name = measure.full_name();
            if measures.contains_key(&full_name) {
                match options.duplicate_measures {
                    DuplicatePolicy::Reject => {
                        return Err(LayoutError::DuplicateMeasure(full_name));
                    }
                    DuplicatePolicy::LastWriteWins => diagnostics.push(Diagnostic::DuplicateMeasure {
                        full_name: full_name.clone(),
                    }),
                }
            }
            measures.insert(full_name, measure);
        }
    }

    Ok(measures)
}

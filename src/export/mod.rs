//! Flat record export.
//!
//! Collaborators that write spreadsheets or feed a search index consume
//! the model as flat rows, one per measure or page, with every list
//! column pre-joined as a sorted `", "`-separated string. The sort keeps
//! output byte-stable across runs; the writing itself is out of scope
//! here.

use crate::model::Report;
use serde::Serialize;

/// One row per measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeasureRecord {
    pub report: String,
    pub table: String,
    pub measure: String,
    pub usage_state: String,
    pub expression: String,
    /// Raw referenced names, sorted and comma-joined.
    pub referenced_measures: String,
    /// Full names of referencing measures, sorted and comma-joined.
    pub referenced_by: String,
    /// Names of pages using the measure, sorted and comma-joined.
    pub used_in_pages: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub last_change: Option<String>,
}

/// One row per page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    pub report: String,
    pub page: String,
    pub is_visible: bool,
    pub visual_count: usize,
    /// Used-measure full names, sorted and comma-joined.
    pub used_measures: String,
    /// Used fields in `Entity[Property]` form, sorted and comma-joined.
    pub used_fields: String,
    /// Non-empty visual titles, comma-joined in document order.
    pub visual_titles: String,
}

/// Flatten every measure of every report into records.
pub fn measure_records(reports: &[Report]) -> Vec<MeasureRecord> {
    let mut records = Vec::new();
    for report in reports {
        for measure in report.measures.values() {
            records.push(MeasureRecord {
                report: report.name.clone(),
                table: measure.entity_name.clone(),
                measure: measure.name.clone(),
                usage_state: measure.usage_state.label().to_string(),
                expression: measure.expression.clone(),
                referenced_measures: join_sorted(measure.referenced_measures.iter().cloned()),
                referenced_by: join_sorted(measure.referenced_by.iter().cloned()),
                used_in_pages: join_sorted(
                    measure.used_in_pages.iter().map(|key| key.name.clone()),
                ),
                author: measure.author.clone(),
                description: measure.description.clone(),
                last_change: measure.last_change.clone(),
            });
        }
    }
    records
}

/// Flatten every page of every report into records.
pub fn page_records(reports: &[Report]) -> Vec<PageRecord> {
    let mut records = Vec::new();
    for report in reports {
        for page in &report.pages {
            records.push(PageRecord {
                report: report.name.clone(),
                page: page.name.clone(),
                is_visible: page.is_visible,
                visual_count: page.visuals.len(),
                used_measures: join_sorted(page.used_measures.iter().cloned()),
                used_fields: join_sorted(page.used_fields.iter().cloned()),
                visual_titles: page.visual_titles.join(", "),
            });
        }
    }
    records
}

/// Lexicographic sort, then `", "` join.
fn join_sorted(items: impl IntoIterator<Item = String>) -> String {
    let mut items: Vec<String> = items.into_iter().collect();
    items.sort_unstable();
    items.join(", ")
}

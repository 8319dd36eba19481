//! Raw layout document types.
//!
//! A report layout arrives as one large JSON document in which several
//! fields are themselves JSON *encoded as strings* (`config`, `filters`,
//! `dataTransforms`). The types here mirror the document surface exactly;
//! interpretation happens in [`crate::model`].
//!
//! Decoding rules:
//! - Absent or empty embedded strings decode to an empty structure.
//! - Present but invalid embedded JSON is fatal for the report.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors that abort construction of a single report.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The layout document itself does not match the expected shape.
    #[error("layout document is not valid: {0}")]
    Document(#[from] serde_json::Error),

    /// An embedded JSON string failed to decode.
    #[error("embedded JSON for {context} is invalid: {source}")]
    Embedded {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Two measures resolved to the same full name under the `Reject` policy.
    #[error("duplicate measure full name: {0}")]
    DuplicateMeasure(String),
}

/// Result type for layout decoding and report construction.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// The top level of a report layout document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    /// Numeric document id, when present.
    #[serde(default)]
    pub id: Option<i64>,

    /// Page records in document order.
    #[serde(default)]
    pub sections: Vec<SectionRecord>,

    /// Report-level configuration, JSON encoded as a string.
    #[serde(default)]
    pub config: Option<String>,

    /// Report-level filters, JSON encoded as a string.
    #[serde(default)]
    pub filters: Option<String>,
}

/// One page ("section") record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord {
    /// Internal section identifier.
    #[serde(default)]
    pub name: String,

    /// Human-readable page name.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Position of the page in the report.
    #[serde(default)]
    pub ordinal: Option<i64>,

    #[serde(default)]
    pub width: Option<f64>,

    #[serde(default)]
    pub height: Option<f64>,

    /// A value of `1` means the page is visible.
    #[serde(default)]
    pub display_option: Option<i64>,

    /// Page-level configuration, JSON encoded as a string.
    #[serde(default)]
    pub config: Option<String>,

    /// Page-level filters, JSON encoded as a string.
    #[serde(default)]
    pub filters: Option<String>,

    /// Visual records in document order.
    #[serde(default)]
    pub visual_containers: Vec<VisualContainer>,
}

/// One visual-container record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualContainer {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,

    /// Visual configuration, JSON encoded as a string. Contains the
    /// `singleVisual` sub-object with type, projections and title.
    #[serde(default)]
    pub config: Option<String>,

    /// Visual-level filters, JSON encoded as a string.
    #[serde(default)]
    pub filters: Option<String>,

    /// Query/data-transform description, JSON encoded as a string.
    #[serde(default)]
    pub data_transforms: Option<String>,
}

/// The decoded report-level `config` string.
///
/// Only the parts the model interprets are typed; everything else in the
/// configuration is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Bookmark definitions. Retained as opaque data.
    #[serde(default)]
    pub bookmarks: Vec<Value>,

    /// Model extension list; the first entry carries the measure
    /// definitions for the report.
    #[serde(default)]
    pub model_extensions: Vec<ModelExtension>,
}

/// One model-extension entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelExtension {
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
}

/// A table ("entity") inside a model extension.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub measures: Vec<MeasureDefinition>,
}

/// A measure definition inside an entity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureDefinition {
    pub name: String,

    /// The raw expression text.
    pub expression: String,

    /// Structured reference list, present when the host resolved
    /// bare `[Name]` references to their owning entities.
    #[serde(default)]
    pub references: Option<ReferenceBlock>,
}

/// Structured references attached to a measure definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceBlock {
    #[serde(default)]
    pub measures: Vec<MeasureRef>,
}

/// One structured measure reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureRef {
    pub entity: String,
    pub name: String,
}

/// Decode a JSON-in-string field.
///
/// Absent and empty strings yield `T::default()`; invalid JSON is fatal.
pub(crate) fn decode_embedded<T>(raw: Option<&str>, context: &'static str) -> LayoutResult<T>
where
    T: DeserializeOwned + Default,
{
    match raw {
        Some(text) if !text.is_empty() => {
            serde_json::from_str(text).map_err(|source| LayoutError::Embedded { context, source })
        }
        _ => Ok(T::default()),
    }
}

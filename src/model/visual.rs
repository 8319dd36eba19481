//! A single visual on a report page.

use crate::extract::find_field_refs;
use crate::layout::{decode_embedded, LayoutResult, VisualContainer};
use serde_json::Value;
use std::collections::BTreeSet;

/// One chart/table/control placed on a page.
///
/// Construction decodes the container's three JSON-in-string fields and
/// derives the set of raw `Entity.Property` references the visual uses.
#[derive(Debug, Clone)]
pub struct Visual {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,

    /// Identifier from `config.name`, empty when absent.
    pub id: String,

    /// Type tag from `config.singleVisual.visualType`.
    pub visual_type: String,

    /// Title literal from the visual configuration, when one is set.
    pub title: Option<String>,

    /// The decoded configuration. Opaque beyond the fields read above.
    pub config: Value,

    /// Decoded visual-level filters.
    pub filters: Vec<Value>,

    /// Decoded data-transform structure. Opaque.
    pub data_transforms: Value,

    /// Raw `Entity.Property` references used by this visual.
    pub used_fields: BTreeSet<String>,
}

impl Visual {
    pub(crate) fn from_container(container: &VisualContainer) -> LayoutResult<Self> {
        let config: Value = decode_embedded(container.config.as_deref(), "visual config")?;
        let filters: Vec<Value> = decode_embedded(container.filters.as_deref(), "visual filters")?;
        let data_transforms: Value =
            decode_embedded(container.data_transforms.as_deref(), "visual dataTransforms")?;

        let single_visual = config
            .get("singleVisual")
            .cloned()
            .unwrap_or(Value::Null);

        let id = config
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let visual_type = single_visual
            .get("visualType")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string();
        let title = extract_title(&single_visual);

        let mut used_fields = BTreeSet::new();
        for filter in &filters {
            used_fields.extend(find_field_refs(filter));
        }
        used_fields.extend(find_field_refs(&data_transforms));
        used_fields.extend(find_field_refs(&single_visual));

        Ok(Self {
            x: container.x,
            y: container.y,
            z: container.z,
            width: container.width,
            height: container.height,
            id,
            visual_type,
            title,
            config,
            filters,
            data_transforms,
            used_fields,
        })
    }
}

/// The visual title lives deep inside the configuration as a quoted
/// literal, e.g. `'Revenue by Region'`.
fn extract_title(single_visual: &Value) -> Option<String> {
    let literal = single_visual
        .pointer("/vcObjects/title/0/properties/text/expr/Literal/Value")?
        .as_str()?;
    let title = literal.trim_matches('\'');
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

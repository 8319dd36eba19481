//! Field-reference discovery over visual and filter structures.
//!
//! Visual configurations, filter definitions and data transforms share no
//! single schema; the same field reference appears under several different
//! shapes depending on where in the document it sits. [`find_field_refs`]
//! walks an arbitrary JSON tree and recognizes each shape in priority
//! order, producing the set of raw `Entity.Property` identifiers reachable
//! from it.

pub mod dax;

pub use dax::strip_wrapper_functions;

use serde_json::Value;
use std::collections::BTreeSet;

/// Collect every field reference reachable from `value`.
///
/// Object shapes are checked in priority order; the first match handles the
/// object and stops further shape checks on it:
///
/// 1. `projections`: role name to entry list, each entry a `queryRef`
///    run through the wrapper stripper.
/// 2. `expression`: recurse into the nested value only (filter shape).
/// 3. `queryMetadata` non-null with a `Select` list: each entry's `Name`.
/// 4. `queryMetadata` null with a `selects` list: each entry's `queryName`.
/// 5. Fallback: a `Property` + `Expression` pair whose `SourceRef.Entity`
///    is present contributes `Entity.Property`, and the walk continues
///    into every value of the object regardless of whether the pair
///    matched.
///
/// Arrays recurse element-wise; scalars contribute nothing. The result is
/// a set, so duplicates collapse and a second run over the same input
/// yields the same set.
pub fn find_field_refs(value: &Value) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    collect_refs(value, &mut found);
    found
}

fn collect_refs(value: &Value, found: &mut BTreeSet<String>) {
    match value {
        Value::Object(object) => {
            // Shape 1: projection roles, typical of singleVisual objects.
            if let Some(projections) = object.get("projections") {
                projection_refs(projections, found);
                return;
            }

            // Shape 2: filter definitions nest the reference under
            // an "expression" key.
            if let Some(expression) = object.get("expression") {
                collect_refs(expression, found);
                return;
            }

            // Shapes 3 and 4: dataTransform objects. Which one applies
            // depends on whether queryMetadata is populated or null.
            match object.get("queryMetadata") {
                Some(metadata) if !metadata.is_null() => {
                    if let Some(select) = metadata.get("Select").and_then(Value::as_array) {
                        select_names(select, found);
                        return;
                    }
                }
                Some(_) => {
                    if let Some(selects) = object.get("selects").and_then(Value::as_array) {
                        query_names(selects, found);
                        return;
                    }
                }
                None => {}
            }

            // Shape 5: the primary leaf pattern for a single field or
            // measure. Additive: generic recursion still visits every
            // value of this object.
            if let (Some(property), Some(expression)) =
                (object.get("Property"), object.get("Expression"))
            {
                let entity = expression
                    .get("SourceRef")
                    .and_then(|source| source.get("Entity"))
                    .and_then(Value::as_str);
                if let (Some(entity), Some(property)) = (entity, property.as_str()) {
                    if !entity.is_empty() && !property.is_empty() {
                        found.insert(format!("{entity}.{property}"));
                    }
                }
            }

            for child in object.values() {
                collect_refs(child, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_refs(item, found);
            }
        }
        _ => {}
    }
}

/// Shape 1: every entry of every projection role carries a `queryRef`
/// string, cleaned of wrapper functions.
fn projection_refs(projections: &Value, found: &mut BTreeSet<String>) {
    let Some(roles) = projections.as_object() else {
        return;
    };
    for entries in roles.values() {
        let Some(entries) = entries.as_array() else {
            continue;
        };
        for entry in entries {
            if let Some(query_ref) = entry.get("queryRef").and_then(Value::as_str) {
                found.extend(strip_wrapper_functions(query_ref));
            }
        }
    }
}

/// Shape 3: each `Select` entry contributes its `Name`, or the empty
/// string when the field is absent.
fn select_names(select: &[Value], found: &mut BTreeSet<String>) {
    for entry in select {
        let name = entry.get("Name").and_then(Value::as_str).unwrap_or("");
        found.insert(name.to_string());
    }
}

/// Shape 4: each `selects` entry contributes its `queryName`; entries
/// without one are skipped, unlike the empty-string rule of
/// [`select_names`].
fn query_names(selects: &[Value], found: &mut BTreeSet<String>) {
    for entry in selects {
        if let Some(name) = entry.get("queryName").and_then(Value::as_str) {
            found.insert(name.to_string());
        }
    }
}

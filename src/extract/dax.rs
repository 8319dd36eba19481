//! Wrapper-function stripping for query-reference strings.
//!
//! Projection entries carry query references like `Sum(Sales.Revenue)` or
//! `Divide(Sum(Sales.Revenue), Count(Orders.ID))`. This module reduces such
//! a string to the base `Entity.Property` field(s) it denotes.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Pattern for the first function-call token in a query reference.
static WRAPPER_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\w+)\(").unwrap());

/// Aggregations whose single argument is the base field.
const SIMPLE_WRAPPERS: [&str; 8] = [
    "Avg",
    "Count",
    "CountNonNull",
    "Max",
    "Median",
    "Min",
    "StandardDeviation",
    "Sum",
];

/// Functions whose arguments are themselves query references.
const RECURSIVE_WRAPPERS: [&str; 2] = ["Divide", "ScopedEval"];

/// Strip wrapper functions from a query reference, returning the set of
/// base field identifiers it denotes.
///
/// Strings without a function token, and strings wrapped in an unrecognized
/// function, pass through unchanged as a singleton set.
///
/// The recursive case splits arguments on commas without tracking paren
/// nesting, so a comma inside an unrecognized nested call lands in the
/// wrong argument. TODO: track paren depth when splitting arguments.
pub fn strip_wrapper_functions(query: &str) -> BTreeSet<String> {
    let mut fields = BTreeSet::new();

    let Some(captures) = WRAPPER_PATTERN.captures(query) else {
        fields.insert(query.to_string());
        return fields;
    };
    let name = &captures[1];

    if RECURSIVE_WRAPPERS.contains(&name) {
        // Drop the function name, its opening paren and the outermost
        // closing paren, then recurse into each comma-separated argument.
        let start = captures.get(0).unwrap().end();
        let content = match query.rfind(')') {
            Some(close) if close >= start => &query[start..close],
            _ => &query[start..],
        };
        for argument in content.split(',') {
            fields.extend(strip_wrapper_functions(argument.trim()));
        }
        return fields;
    }

    if SIMPLE_WRAPPERS.contains(&name) {
        // The base field sits between the first '(' and the last ')'.
        match (query.find('('), query.rfind(')')) {
            (Some(open), Some(close)) if open < close => {
                fields.insert(query[open + 1..close].to_string());
            }
            _ => {
                fields.insert(query.to_string());
            }
        }
        return fields;
    }

    // Unknown functions are not stripped.
    fields.insert(query.to_string());
    fields
}

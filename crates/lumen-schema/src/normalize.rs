//! Defaulting, canonical forms and read-back rendering.
//!
//! # Purpose
//! Turns validated assignments into stored values, folds case-insensitive
//! tokens onto their canonical spelling, and renders stored objects for
//! reads with secrets masked.
use crate::catalog::SENSITIVE_MASK;
use crate::schema::{ObjectType, PropertySchema};
use crate::value::is_unset;
use serde_json::{Map, Value};

/// Result of validating one submitted property.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    Set(Value),
    /// Back to the schema default. Produced by `null` and by clearing zeroes.
    Reset,
}

/// Value to store for a validated assignment.
pub fn resolve(schema: &PropertySchema, assignment: Assignment) -> Value {
    match assignment {
        Assignment::Set(value) => value,
        Assignment::Reset => schema.default.clone(),
    }
}

/// Canonical spelling of `raw` within `values`, compared case-insensitively.
pub fn canonical_enum(values: &[&'static str], raw: &str) -> Option<&'static str> {
    values
        .iter()
        .copied()
        .find(|candidate| candidate.eq_ignore_ascii_case(raw.trim()))
}

/// Canonical comma-joined token set, in schema order.
///
/// Returns `None` for unknown or empty tokens, or when the aggregate token is
/// mixed with individual ones.
pub fn canonical_tokens(
    values: &[&'static str],
    aggregate: Option<&'static str>,
    raw: &str,
) -> Option<String> {
    let mut saw_aggregate = false;
    let mut picked = vec![false; values.len()];
    for token in raw.split(',').map(str::trim) {
        if token.is_empty() {
            return None;
        }
        if aggregate.is_some_and(|all| all.eq_ignore_ascii_case(token)) {
            saw_aggregate = true;
            continue;
        }
        let idx = values
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(token))?;
        picked[idx] = true;
    }
    let any_individual = picked.iter().any(|flag| *flag);
    match (saw_aggregate, any_individual) {
        (true, true) => None,
        (true, false) => aggregate.map(str::to_string),
        (false, true) => Some(
            values
                .iter()
                .zip(picked)
                .filter(|(_, flag)| *flag)
                .map(|(value, _)| *value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        (false, false) => None,
    }
}

/// Names in a reference list, trimmed and de-duplicated in submission order.
pub fn reference_names(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|token| !token.is_empty()) {
        if !names.iter().any(|existing| existing == token) {
            names.push(token.to_string());
        }
    }
    names
}

/// Names held by a stored reference value.
pub fn stored_reference_names(value: &Value) -> Vec<String> {
    value.as_str().map(reference_names).unwrap_or_default()
}

/// True when the property must be dropped for the object's current variant.
pub fn ignored_for_variant(schema: &PropertySchema, variant_active: bool) -> bool {
    schema.ignored_for_variant && variant_active
}

/// Stored properties as returned to readers.
pub fn render(object: &ObjectType, stored: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for schema in object.properties.iter().filter(|prop| !prop.transient) {
        let value = stored
            .get(schema.name)
            .cloned()
            .unwrap_or_else(|| schema.default.clone());
        if object.omit_null_on_read && value.is_null() {
            continue;
        }
        let value = if schema.sensitive && !is_unset(&value) {
            Value::String(SENSITIVE_MASK.to_string())
        } else {
            value
        };
        out.insert(schema.name.to_string(), value);
    }
    out
}

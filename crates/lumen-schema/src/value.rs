// Naming and echoing of raw JSON values in error messages.
use serde_json::Value;

/// JSON kind label used by type-mismatch errors.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "JSON_NULL",
        Value::Bool(true) => "JSON_TRUE",
        Value::Bool(false) => "JSON_FALSE",
        Value::Number(number) if number.is_i64() || number.is_u64() => "JSON_INTEGER",
        Value::Number(_) => "JSON_REAL",
        Value::String(_) => "JSON_STRING",
        Value::Array(_) => "JSON_ARRAY",
        Value::Object(_) => "JSON_OBJECT",
    }
}

/// Text shown inside `Value: "..."` for an offending value.
pub fn shown(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

/// True for `null`, an empty string or an empty array.
pub fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

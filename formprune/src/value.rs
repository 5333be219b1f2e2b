use std::collections::BTreeSet;

use serde_json::Value;

/// Returns true for values that can hold nested values (`Object` and `Array`).
pub fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Duck-typed truthiness of a form attribute flag such as `tree` or `input`.
///
/// `null`, `false`, `0` and `""` are falsy; every other value, including
/// empty arrays and objects, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Truthiness of `value[attr]`, false when the attribute is absent.
pub fn flag(value: &Value, attr: &str) -> bool {
    value.get(attr).is_some_and(is_truthy)
}

/// Reads a boolean form property, falling back to `default`.
///
/// Booleans read as themselves, numbers as `!= 0` and the strings `"true"`
/// and `"false"` as their value. Anything else, or a missing value, gives
/// `default`.
pub fn as_boolean(value: Option<&Value>, default: bool) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(default, |f| f != 0.0),
        Some(Value::String(s)) => match s.trim() {
            "true" => true,
            "false" => false,
            _ => default,
        },
        _ => default,
    }
}

/// Own keys of an object. Every other kind of value has no keys.
pub fn key_set(value: &Value) -> BTreeSet<&str> {
    match value {
        Value::Object(map) => map.keys().map(String::as_str).collect(),
        _ => BTreeSet::new(),
    }
}

/// Short name of the value's kind, used in log lines.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

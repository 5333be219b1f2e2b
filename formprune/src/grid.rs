//! Row wrapping for grids that store bare values.
//!
//! A repeating grid with a single column and `properties.noRowWrapping`
//! set keeps its rows as bare values (`["a", "b"]`) outside the form, while
//! the form engine expects one object per row (`[{"col": "a"}, ...]`).
//! [`wrap_grid_data`] turns stored data into the engine's shape and
//! [`unwrap_grid_data`] turns it back.

use serde_json::{Map, Value};

use crate::{fields::child_components, schema::SchemaBuilder, value::as_boolean};

/// Grid property that marks rows as stored unwrapped.
pub const NO_ROW_WRAPPING: &str = "noRowWrapping";

fn key_of(component: &Value) -> Option<&str> {
    component.get("key").and_then(Value::as_str)
}

fn has_components(definition: &Value) -> bool {
    definition.get("components").is_some()
}

fn column_count(definition: &Value) -> usize {
    definition
        .get("components")
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

fn no_row_wrapping(builder: &SchemaBuilder, definition: &Value) -> bool {
    let repeating = definition
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|ty| builder.is_repeating(ty));
    repeating && as_boolean(definition.pointer(&format!("/properties/{NO_ROW_WRAPPING}")), false)
}

/// Wraps the bare rows of `noRowWrapping` grids found in `data`.
///
/// Each bare row `v` becomes `{ firstColumnKey: v }`. Everything else is
/// copied unchanged.
pub fn wrap_grid_data(data: &Value, definition: &Value) -> Value {
    wrap_grid_data_with(&SchemaBuilder::default(), data, definition)
}

/// [`wrap_grid_data`] with a custom set of repeating container types.
pub fn wrap_grid_data_with(builder: &SchemaBuilder, data: &Value, definition: &Value) -> Value {
    match data {
        Value::Object(fields) => {
            let mut wrapped = fields.clone();
            if has_components(definition) {
                for child in child_components(definition) {
                    let Some(key) = key_of(child) else {
                        continue;
                    };
                    if let Some(value) = fields.get(key) {
                        wrapped.insert(key.to_string(), wrap_grid_data_with(builder, value, child));
                    }
                }
            }
            Value::Object(wrapped)
        }
        Value::Array(rows) => {
            let wrapper = no_row_wrapping(builder, definition).then(|| {
                definition
                    .pointer("/components/0/key")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
            });
            let rows = rows
                .iter()
                .map(|row| match wrapper {
                    Some(column) => {
                        let mut wrapped = Map::new();
                        wrapped.insert(column.to_string(), row.clone());
                        wrap_grid_data_with(builder, &Value::Object(wrapped), definition)
                    }
                    None => wrap_grid_data_with(builder, row, definition),
                })
                .collect();
            Value::Array(rows)
        }
        other => other.clone(),
    }
}

/// Reverses [`wrap_grid_data`].
///
/// Only fields the definition declares are kept. Rows of a single-column
/// `noRowWrapping` grid are replaced by their only value.
pub fn unwrap_grid_data(data: &Value, definition: &Value) -> Value {
    unwrap_grid_data_with(&SchemaBuilder::default(), data, definition)
}

/// [`unwrap_grid_data`] with a custom set of repeating container types.
pub fn unwrap_grid_data_with(builder: &SchemaBuilder, data: &Value, definition: &Value) -> Value {
    if !has_components(definition) {
        return data.clone();
    }
    let children = child_components(definition);

    match data {
        Value::Object(fields) => Value::Object(unwrap_fields(builder, fields, &children)),
        Value::Array(rows) => Value::Array(
            rows.iter()
                .map(|row| match row {
                    Value::Object(fields) => Value::Object(unwrap_fields(builder, fields, &children)),
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

fn unwrap_fields(builder: &SchemaBuilder, fields: &Map<String, Value>, children: &[&Value]) -> Map<String, Value> {
    let mut unwrapped = Map::new();
    for child in children {
        let Some(key) = key_of(child) else {
            continue;
        };
        if let Some(value) = fields.get(key) {
            unwrapped.insert(key.to_string(), unwrap_field(builder, value, child));
        }
    }
    unwrapped
}

fn unwrap_field(builder: &SchemaBuilder, value: &Value, child: &Value) -> Value {
    let value = unwrap_grid_data_with(builder, value, child);
    match value {
        Value::Array(rows) if no_row_wrapping(builder, child) && column_count(child) == 1 => {
            trace!("unwrapping {} rows", rows.len());
            Value::Array(rows.into_iter().map(first_value).collect())
        }
        other => other,
    }
}

/// The only value of a wrapped row. Rows that are not single objects stay.
fn first_value(row: Value) -> Value {
    match row {
        Value::Object(fields) if !fields.is_empty() => fields
            .into_iter()
            .next()
            .map(|(_, value)| value)
            .unwrap_or(Value::Null),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tags_form(no_row_wrapping: Value) -> Value {
        json!({
            "components": [
                { "type": "textfield", "key": "name", "input": true },
                {
                    "type": "datagrid", "key": "tags", "input": true, "tree": true,
                    "properties": { "noRowWrapping": no_row_wrapping },
                    "components": [{ "type": "textfield", "key": "tag", "input": true }]
                }
            ]
        })
    }

    #[test]
    fn test_wrap_bare_rows() {
        let data = json!({ "name": "Ann", "tags": ["a", "b"] });
        assert_eq!(
            wrap_grid_data(&data, &tags_form(json!(true))),
            json!({ "name": "Ann", "tags": [{ "tag": "a" }, { "tag": "b" }] })
        );
    }

    #[test]
    fn test_wrap_requires_flag() {
        let data = json!({ "name": "Ann", "tags": ["a"], "other": 1 });
        assert_eq!(wrap_grid_data(&data, &tags_form(json!(false))), data);
        assert_eq!(wrap_grid_data(&data, &tags_form(json!("true"))), json!({
            "name": "Ann", "tags": [{ "tag": "a" }], "other": 1
        }));
    }

    #[test]
    fn test_unwrap_restores_bare_rows() {
        let form = tags_form(json!(true));
        let stored = json!({ "name": "Ann", "tags": ["a", "b"] });
        let wrapped = wrap_grid_data(&stored, &form);
        assert_eq!(unwrap_grid_data(&wrapped, &form), stored);
    }

    #[test]
    fn test_unwrap_keeps_wrapped_rows_without_flag() {
        let form = tags_form(json!(false));
        let data = json!({ "name": "Ann", "tags": [{ "tag": "a", "junk": 1 }], "extra": true });
        assert_eq!(
            unwrap_grid_data(&data, &form),
            json!({ "name": "Ann", "tags": [{ "tag": "a" }] })
        );
    }

    #[test]
    fn test_nested_grids() {
        let form = json!({
            "components": [{
                "type": "editgrid", "key": "groups", "tree": true,
                "components": [
                    { "type": "textfield", "key": "title", "input": true },
                    {
                        "type": "datagrid", "key": "members", "tree": true,
                        "properties": { "noRowWrapping": true },
                        "components": [{ "type": "textfield", "key": "member", "input": true }]
                    }
                ]
            }]
        });
        let stored = json!({ "groups": [{ "title": "x", "members": ["m1", "m2"] }] });
        let wrapped = wrap_grid_data(&stored, &form);
        assert_eq!(
            wrapped,
            json!({ "groups": [{ "title": "x", "members": [{ "member": "m1" }, { "member": "m2" }] }] })
        );
        assert_eq!(unwrap_grid_data(&wrapped, &form), stored);
    }

    #[test]
    fn test_multi_column_grid_rows_stay_objects() {
        let form = json!({
            "components": [{
                "type": "datagrid", "key": "rows", "tree": true,
                "properties": { "noRowWrapping": true },
                "components": [{ "key": "a", "input": true }, { "key": "b", "input": true }]
            }]
        });
        let data = json!({ "rows": [{ "a": 1, "b": 2 }] });
        assert_eq!(unwrap_grid_data(&data, &form), data);
    }

    #[test]
    fn test_custom_repeating_types() {
        let builder = SchemaBuilder::new(["list"]);
        let form = json!({
            "components": [{
                "type": "list", "key": "items", "tree": true,
                "properties": { "noRowWrapping": true },
                "components": [{ "key": "item", "input": true }]
            }]
        });
        let stored = json!({ "items": [1, 2] });
        let wrapped = wrap_grid_data_with(&builder, &stored, &form);
        assert_eq!(wrapped, json!({ "items": [{ "item": 1 }, { "item": 2 }] }));
        assert_eq!(unwrap_grid_data_with(&builder, &wrapped, &form), stored);
        assert_eq!(wrap_grid_data(&stored, &form), stored);
    }

    #[test]
    fn test_scalars_pass_through() {
        let form = tags_form(json!(true));
        assert_eq!(wrap_grid_data(&json!("x"), &form), json!("x"));
        assert_eq!(unwrap_grid_data(&json!(3), &form), json!(3));
        assert_eq!(unwrap_grid_data(&json!({ "a": 1 }), &json!({})), json!({ "a": 1 }));
    }
}

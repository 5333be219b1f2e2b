//! Submission data pruning.
//!
//! [`prune`] walks submitted data in lock-step with a shape schema (see
//! [`crate::schema`]) and builds a new value holding only what the schema
//! allows. Structurally incompatible input is narrowed, never rejected:
//!
//! - undeclared object keys are dropped,
//! - a scalar where a container is declared is dropped,
//! - rows where an object is declared, or an object where rows are
//!   declared, become an empty list,
//! - rows that are not objects, or whose keys are all unknown to the row
//!   template, are dropped.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::value::{is_container, key_set, kind_name};

/// Prunes `data` down to the shape allowed by `schema`.
///
/// Neither argument is modified. Scalars and `null` pass through, and so
/// does everything below a non-container schema node such as the `true`
/// leaf marker.
pub fn prune(data: &Value, schema: &Value) -> Value {
    if !is_container(schema) {
        return data.clone();
    }

    match data {
        Value::Array(rows) => prune_rows(rows, schema),
        Value::Object(fields) => match schema {
            Value::Object(shape) => Value::Object(prune_fields(fields, shape)),
            _ => {
                debug!("object found where rows are declared, emptied");
                Value::Array(Vec::new())
            }
        },
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => data.clone(),
    }
}

/// Alias of [`prune`] named after the bridge operation.
pub fn prune_data(data: &Value, schema: &Value) -> Value {
    prune(data, schema)
}

fn prune_rows(rows: &[Value], schema: &Value) -> Value {
    let Value::Array(templates) = schema else {
        debug!("{} rows found where an object is declared, emptied", rows.len());
        return Value::Array(Vec::new());
    };
    let Some(template) = templates.first() else {
        return Value::Array(Vec::new());
    };

    let allowed = key_set(template);
    let kept = rows
        .iter()
        .filter(|row| {
            let is_row = row.is_object();
            if !is_row {
                trace!("dropping {} inside rows", kind_name(row));
            }
            is_row
        })
        .filter(|row| fits_template(row, &allowed))
        .map(|row| prune(row, template))
        .collect::<Vec<_>>();

    if kept.len() != rows.len() {
        debug!("kept {} of {} rows", kept.len(), rows.len());
    }
    Value::Array(kept)
}

/// A row fits when it is empty or declares at least one template key.
///
/// Rows mixing declared and undeclared keys are kept here and narrowed by
/// the recursive prune.
fn fits_template(row: &Value, allowed: &BTreeSet<&str>) -> bool {
    let keys = key_set(row);
    keys.is_empty() || !keys.is_disjoint(allowed)
}

fn prune_fields(fields: &Map<String, Value>, shape: &Map<String, Value>) -> Map<String, Value> {
    let mut kept = Map::new();
    for (key, value) in fields {
        let Some(field_shape) = shape.get(key) else {
            trace!("dropping undeclared key `{key}`");
            continue;
        };

        if !is_container(field_shape) {
            kept.insert(key.clone(), value.clone());
        } else if is_container(value) {
            kept.insert(key.clone(), prune(value, field_shape));
        } else {
            trace!("dropping `{key}`: {} where a container is declared", kind_name(value));
        }
    }
    kept
}

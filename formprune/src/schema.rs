//! Shape schema inference.
//!
//! A shape schema mirrors the data a form can submit:
//!
//! - `true` marks an input field,
//! - an object holds the allowed keys of a singular container,
//! - a one-element array holds the row template of a repeating container.
//!
//! ```rust
//! use formprune::SchemaBuilder;
//! use serde_json::json;
//!
//! let form = json!([
//!     {
//!         "type": "container", "key": "address", "tree": true,
//!         "components": [{ "key": "city", "input": true }]
//!     },
//!     { "type": "panel", "components": [{ "key": "email", "input": true }] }
//! ]);
//!
//! let schema = SchemaBuilder::default().derive(&form);
//! assert_eq!(schema, json!({ "address": { "city": true }, "email": true }));
//! ```

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::value::{is_container, is_truthy};

/// Component types whose submitted value is a list of rows.
pub const DEFAULT_REPEATING_TYPES: &[&str] = &["datagrid", "editgrid"];

/// Derives shape schemas from form definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaBuilder {
    repeating: BTreeSet<String>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_REPEATING_TYPES.iter().copied())
    }
}

impl SchemaBuilder {
    /// Creates a builder that treats the given component types as repeating.
    pub fn new<I, S>(repeating_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            repeating: repeating_types.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a component `type` tag denotes a repeating container.
    pub fn is_repeating(&self, component_type: &str) -> bool {
        self.repeating.contains(component_type)
    }

    /// Repeating container types, sorted.
    pub fn repeating_types(&self) -> impl Iterator<Item = &str> {
        self.repeating.iter().map(String::as_str)
    }

    /// Derives the shape schema of a form definition.
    ///
    /// `form` may be a single component, a whole form wrapper or a list of
    /// components. The result is always an object.
    pub fn derive(&self, form: &Value) -> Value {
        let mut schema = Value::Object(Map::new());
        self.derive_into(form, &mut schema);
        trace!("derived schema: {schema}");
        schema
    }

    /// Records the shape contributed by `node` into `acc`.
    ///
    /// Siblings share one accumulator. An object accumulator keeps the last
    /// shape recorded under a key; an array accumulator gets one
    /// `{ key: shape }` marker appended per recorded field, duplicates
    /// included. Any other accumulator records nothing.
    pub fn derive_into(&self, node: &Value, acc: &mut Value) {
        match node {
            Value::Array(items) => {
                for item in items {
                    self.derive_into(item, acc);
                }
            }
            Value::Object(component) => self.visit_component(component, acc),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
    }

    fn visit_component(&self, component: &Map<String, Value>, acc: &mut Value) {
        let key = component.get("key").and_then(Value::as_str);

        if let Some(children) = container_children(component) {
            let Some(key) = key else {
                debug!("container without a key, lifting its children");
                for child in children {
                    self.derive_into(child, acc);
                }
                return;
            };

            let mut template = Value::Object(Map::new());
            for child in children {
                self.derive_into(child, &mut template);
            }

            let repeating = component
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|ty| self.is_repeating(ty));
            let shape = if repeating {
                Value::Array(vec![template])
            } else {
                template
            };
            record(acc, key, shape);
        } else if component.get("input").is_some_and(is_truthy) {
            match key {
                Some(key) => record(acc, key, Value::Bool(true)),
                None => debug!("input component without a key ignored"),
            }
        } else {
            for value in component.values().filter(|v| is_container(v)) {
                self.derive_into(value, acc);
            }
        }
    }
}

/// Child components of a container node, if `node` is one.
fn container_children(component: &Map<String, Value>) -> Option<&Vec<Value>> {
    let node_is_tree = component.get("tree").is_some_and(is_truthy);
    match component.get("components") {
        Some(Value::Array(children)) if node_is_tree => Some(children),
        _ => None,
    }
}

fn record(acc: &mut Value, key: &str, shape: Value) {
    match acc {
        Value::Object(fields) => {
            fields.insert(key.to_string(), shape);
        }
        Value::Array(markers) => {
            let mut marker = Map::new();
            marker.insert(key.to_string(), shape);
            markers.push(Value::Object(marker));
        }
        _ => {}
    }
}

/// Derives a shape schema with the default repeating container types.
pub fn derive_schema(form: &Value) -> Value {
    SchemaBuilder::default().derive(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(key: &str) -> Value {
        json!({ "type": "textfield", "key": key, "input": true })
    }

    #[test]
    fn test_leaf_fields() {
        let form = json!({ "components": [text("name"), text("age")] });
        assert_eq!(derive_schema(&form), json!({ "name": true, "age": true }));
    }

    #[test]
    fn test_singular_container() {
        let form = json!({
            "components": [{
                "type": "container", "key": "panel", "tree": true, "input": true,
                "components": [text("email")]
            }]
        });
        assert_eq!(derive_schema(&form), json!({ "panel": { "email": true } }));
    }

    #[test]
    fn test_repeating_container_has_single_template() {
        let form = json!({
            "components": [{
                "type": "datagrid", "key": "rows", "tree": true, "input": true,
                "components": [text("city"), text("zip"), text("street")]
            }]
        });
        let schema = derive_schema(&form);
        assert_eq!(
            schema,
            json!({ "rows": [{ "city": true, "zip": true, "street": true }] })
        );
        assert_eq!(schema["rows"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_editgrid_is_repeating_by_default() {
        let form = json!({
            "type": "editgrid", "key": "items", "tree": true,
            "components": [text("sku")]
        });
        assert_eq!(derive_schema(&form), json!({ "items": [{ "sku": true }] }));
    }

    #[test]
    fn test_custom_repeating_types() {
        let form = json!({
            "type": "editgrid", "key": "items", "tree": true,
            "components": [text("sku")]
        });
        let builder = SchemaBuilder::new(["datagrid"]);
        assert!(!builder.is_repeating("editgrid"));
        assert_eq!(builder.derive(&form), json!({ "items": { "sku": true } }));
    }

    #[test]
    fn test_layout_components_are_transparent() {
        let form = json!({
            "display": "form",
            "components": [
                { "type": "panel", "key": "page1", "input": false, "components": [text("a")] },
                {
                    "type": "columns", "key": "cols",
                    "columns": [{ "components": [text("b")] }, { "components": [text("c")] }]
                },
                {
                    "type": "table", "key": "table",
                    "rows": [[{ "components": [text("d")] }]]
                },
                { "type": "button", "key": "submit", "input": false, "label": "Submit" }
            ]
        });
        assert_eq!(
            derive_schema(&form),
            json!({ "a": true, "b": true, "c": true, "d": true })
        );
    }

    #[test]
    fn test_nested_repeating_inside_container() {
        let form = json!([{
            "type": "container", "key": "order", "tree": true,
            "components": [
                text("id"),
                {
                    "type": "datagrid", "key": "lines", "tree": true,
                    "components": [
                        text("qty"),
                        {
                            "type": "container", "key": "product", "tree": true,
                            "components": [text("sku")]
                        }
                    ]
                }
            ]
        }]);
        assert_eq!(
            derive_schema(&form),
            json!({
                "order": {
                    "id": true,
                    "lines": [{ "qty": true, "product": { "sku": true } }]
                }
            })
        );
    }

    #[test]
    fn test_tree_without_component_list_is_not_a_container() {
        let form = json!({ "type": "container", "key": "c", "tree": true, "input": true, "components": {} });
        assert_eq!(derive_schema(&form), json!({ "c": true }));
    }

    #[test]
    fn test_duplicate_keys_in_object_last_wins() {
        let form = json!([
            { "type": "container", "key": "dup", "tree": true, "components": [text("x")] },
            text("dup")
        ]);
        assert_eq!(derive_schema(&form), json!({ "dup": true }));
    }

    #[test]
    fn test_array_accumulator_appends_markers() {
        let mut acc = json!([]);
        let builder = SchemaBuilder::default();
        builder.derive_into(&json!([text("a"), text("a")]), &mut acc);
        builder.derive_into(
            &json!({ "type": "container", "key": "c", "tree": true, "components": [text("b")] }),
            &mut acc,
        );
        assert_eq!(
            acc,
            json!([{ "a": true }, { "a": true }, { "c": { "b": true } }])
        );
    }

    #[test]
    fn test_scalar_accumulator_records_nothing() {
        let mut acc = json!(7);
        SchemaBuilder::default().derive_into(&text("a"), &mut acc);
        assert_eq!(acc, json!(7));
    }

    #[test]
    fn test_keyless_nodes() {
        let form = json!([
            { "input": true, "type": "textfield" },
            { "type": "container", "tree": true, "components": [text("lifted")] }
        ]);
        assert_eq!(derive_schema(&form), json!({ "lifted": true }));
    }

    #[test]
    fn test_primitives_contribute_nothing() {
        assert_eq!(derive_schema(&Value::Null), json!({}));
        assert_eq!(derive_schema(&json!("form")), json!({}));
        assert_eq!(derive_schema(&json!([1, true, null])), json!({}));
    }

    #[test]
    fn test_derive_is_repeatable() {
        let form = json!({ "components": [text("a"), { "key": "g", "type": "datagrid", "tree": true, "components": [text("b")] }] });
        let before = form.clone();
        let first = derive_schema(&form);
        let second = derive_schema(&form);
        assert_eq!(first, second);
        assert_eq!(form, before);
    }
}

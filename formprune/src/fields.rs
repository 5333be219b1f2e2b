use serde_json::Value;

use crate::value::flag;

/// Layout components: they arrange other components and hold no data.
const LAYOUT_TYPES: &[&str] = &["well", "table", "columns", "fieldset", "panel"];

/// Layout components that keep their children in `components`.
const WRAPPER_TYPES: &[&str] = &["well", "fieldset", "panel"];

fn list(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

fn type_of(component: &Value) -> &str {
    component.get("type").and_then(Value::as_str).unwrap_or("")
}

/// Components that contribute to the definition's own data level.
///
/// Direct children come first, then children of wells, fieldsets and
/// panels, then the contents of columns, then the cells of tables. Only
/// one layout level is looked through.
pub fn child_components(definition: &Value) -> Vec<&Value> {
    let components = list(definition.get("components"));

    let mut nodes = components
        .iter()
        .filter(|c| !LAYOUT_TYPES.iter().any(|ty| *ty == type_of(c)))
        .collect::<Vec<_>>();

    nodes.extend(
        components
            .iter()
            .filter(|c| WRAPPER_TYPES.iter().any(|ty| *ty == type_of(c)))
            .flat_map(|c| list(c.get("components"))),
    );

    nodes.extend(
        components
            .iter()
            .filter(|c| type_of(c) == "columns")
            .flat_map(|c| list(c.get("columns")))
            .flat_map(|column| list(column.get("components"))),
    );

    nodes.extend(
        components
            .iter()
            .filter(|c| type_of(c) == "table")
            .flat_map(|c| list(c.get("rows")))
            .flat_map(|row| list(Some(row)))
            .flat_map(|cell| list(cell.get("components"))),
    );

    nodes
}

/// Keys of the input fields a form submits at its top level.
///
/// ```rust
/// use formprune::variable_names;
/// use serde_json::json;
///
/// let form = json!({
///     "components": [
///         { "type": "textfield", "key": "name", "input": true },
///         { "type": "panel", "key": "p", "components": [
///             { "type": "email", "key": "email", "input": true }
///         ]},
///         { "type": "button", "key": "submit", "input": false }
///     ]
/// });
/// assert_eq!(variable_names(&form), vec!["name", "email"]);
/// ```
pub fn variable_names(form: &Value) -> Vec<String> {
    child_components(form)
        .into_iter()
        .filter(|c| flag(c, "input"))
        .filter_map(|c| c.get("key").and_then(Value::as_str))
        .filter(|key| !key.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(key: &str) -> Value {
        json!({ "type": "textfield", "key": key, "input": true })
    }

    #[test]
    fn test_layouts_are_looked_through_once() {
        let form = json!({
            "components": [
                { "type": "table", "key": "t", "rows": [
                    [{ "components": [text("cell1")] }, { "components": [text("cell2")] }]
                ]},
                { "type": "columns", "key": "c", "columns": [
                    { "components": [text("left")] },
                    { "components": [text("right")] }
                ]},
                { "type": "fieldset", "key": "f", "components": [
                    text("inner"),
                    { "type": "panel", "key": "deep", "components": [text("too_deep")] }
                ]},
                text("direct")
            ]
        });
        assert_eq!(
            variable_names(&form),
            vec!["direct", "inner", "left", "right", "cell1", "cell2"]
        );
    }

    #[test]
    fn test_containers_are_variables() {
        let form = json!({
            "components": [
                { "type": "datagrid", "key": "rows", "input": true, "tree": true, "components": [text("x")] },
                { "type": "container", "key": "box", "input": true, "tree": true, "components": [text("y")] }
            ]
        });
        assert_eq!(variable_names(&form), vec!["rows", "box"]);
    }

    #[test]
    fn test_blank_and_missing_keys_skipped() {
        let form = json!({
            "components": [
                { "type": "textfield", "key": "  ", "input": true },
                { "type": "textfield", "input": true },
                { "type": "htmlelement", "key": "html", "input": false },
                text("ok")
            ]
        });
        assert_eq!(variable_names(&form), vec!["ok"]);
    }

    #[test]
    fn test_no_components() {
        assert!(variable_names(&json!({})).is_empty());
        assert!(child_components(&json!({ "components": "nope" })).is_empty());
    }
}

use serde_json::{Map, Value};

use crate::{prune::prune, schema::SchemaBuilder, value::as_boolean};

/// Button action that saves a submission in a named state.
pub const SAVE_STATE_ACTION: &str = "saveState";

/// Cleans the `data` of a submission against the form it was made with.
///
/// Every other top-level field of the submission (metadata, state, ...) is
/// carried over unchanged. A submission that is not an object, or has no
/// `data`, is returned as is.
pub fn clean_submission(form: &Value, submission: &Value) -> Value {
    clean_submission_with(&SchemaBuilder::default(), form, submission)
}

/// [`clean_submission`] with a custom set of repeating container types.
pub fn clean_submission_with(builder: &SchemaBuilder, form: &Value, submission: &Value) -> Value {
    let Value::Object(fields) = submission else {
        debug!("submission is not an object, left as is");
        return submission.clone();
    };
    let Some(data) = fields.get("data") else {
        debug!("submission has no data, left as is");
        return submission.clone();
    };

    let schema = builder.derive(form);
    let mut cleaned = fields.clone();
    cleaned.insert("data".to_string(), prune(data, &schema));
    Value::Object(cleaned)
}

/// Turns a bare data object into a submission.
///
/// Objects that already carry `data` are taken to be submissions; any
/// other object becomes `{ "data": payload }`. Non-objects are returned as is.
pub fn wrap_submission(payload: Value) -> Value {
    match payload {
        Value::Object(fields) if !fields.contains_key("data") => {
            let mut submission = Map::new();
            submission.insert("data".to_string(), Value::Object(fields));
            Value::Object(submission)
        }
        other => other,
    }
}

/// Whether a submission saved in `state` should be processed further.
///
/// The first `saveState` button for that state, searched depth first, decides
/// through its `properties.isSubmissionProcessed`. Without such a button, or
/// without the property, the answer is yes.
pub fn should_process_submission(form: &Value, state: &str) -> bool {
    let Some(button) = find_save_state(form, state) else {
        trace!("no {SAVE_STATE_ACTION} button for state {state:?}");
        return true;
    };
    as_boolean(button.pointer("/properties/isSubmissionProcessed"), true)
}

fn find_save_state<'a>(node: &'a Value, state: &str) -> Option<&'a Value> {
    match node {
        Value::Object(fields) => {
            if let Some(Value::Array(components)) = fields.get("components") {
                let found = components.iter().find(|c| {
                    c.get("action").and_then(Value::as_str) == Some(SAVE_STATE_ACTION)
                        && c.get("state").and_then(Value::as_str) == Some(state)
                });
                if found.is_some() {
                    return found;
                }
            }
            fields.values().find_map(|v| find_save_state(v, state))
        }
        Value::Array(items) => items.iter().find_map(|v| find_save_state(v, state)),
        _ => None,
    }
}

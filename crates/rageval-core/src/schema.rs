//! Structural validation of untrusted input records.
//!
//! Input must be a JSON array of objects with exactly the keys `question`
//! (string), `answer` (string) and `contexts` (array of strings). Validation
//! is all-or-nothing: the first violation is returned and no records are.

use serde_json::{Map, Value};

use crate::domain::error::{json_type_name, SchemaError};
use crate::domain::EvaluationRecord;

/// Keys every record must carry, in the order they are checked.
pub const REQUIRED_KEYS: [&str; 3] = ["question", "answer", "contexts"];

/// Validate raw JSON and build the ordered record list.
pub fn validate(raw: &Value) -> Result<Vec<EvaluationRecord>, SchemaError> {
    let items = raw.as_array().ok_or(SchemaError::NotAnArray {
        found: json_type_name(raw),
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| validate_record(index, item))
        .collect()
}

fn validate_record(index: usize, item: &Value) -> Result<EvaluationRecord, SchemaError> {
    let obj = item.as_object().ok_or(SchemaError::RecordNotObject {
        index,
        found: json_type_name(item),
    })?;

    // serde_json maps iterate in sorted key order, so the reported key is stable.
    if let Some(key) = obj.keys().find(|k| !REQUIRED_KEYS.contains(&k.as_str())) {
        return Err(SchemaError::UnexpectedKey {
            index,
            key: key.clone(),
        });
    }

    let question = required_string(obj, index, "question")?;
    let answer = required_string(obj, index, "answer")?;
    let contexts = required_contexts(obj, index)?;

    Ok(EvaluationRecord::new(question, answer, contexts))
}

fn required<'a>(
    obj: &'a Map<String, Value>,
    index: usize,
    key: &'static str,
) -> Result<&'a Value, SchemaError> {
    obj.get(key).ok_or(SchemaError::MissingKey { index, key })
}

fn required_string(
    obj: &Map<String, Value>,
    index: usize,
    key: &'static str,
) -> Result<String, SchemaError> {
    let value = required(obj, index, key)?;
    let s = value.as_str().ok_or(SchemaError::WrongType {
        index,
        key,
        expected: "a string",
        found: json_type_name(value),
    })?;
    if s.is_empty() {
        return Err(SchemaError::EmptyField { index, key });
    }
    Ok(s.to_string())
}

fn required_contexts(obj: &Map<String, Value>, index: usize) -> Result<Vec<String>, SchemaError> {
    let value = required(obj, index, "contexts")?;
    let items = value.as_array().ok_or(SchemaError::WrongType {
        index,
        key: "contexts",
        expected: "an array of strings",
        found: json_type_name(value),
    })?;

    items
        .iter()
        .enumerate()
        .map(|(position, ctx)| {
            ctx.as_str()
                .map(str::to_string)
                .ok_or(SchemaError::ContextNotString {
                    index,
                    position,
                    found: json_type_name(ctx),
                })
        })
        .collect()
}

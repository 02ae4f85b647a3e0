//! On-disk JSON shapes for record collections.
//!
//! Two shapes are in use:
//!
//! ```text
//! Flat        [ {record}, {record}, ... ]
//! Enveloped   [ { "<field>": [ {record}, ... ] }, ... ]
//! ```
//!
//! Decoding is tolerant. Missing fields take their defaults, unknown fields are ignored and
//! `null` values are treated as missing. Enveloped documents may hold several wrappers (their
//! lists are concatenated) or be a bare wrapper object. Encoding is canonical: pretty-printed,
//! and an enveloped collection is always written as exactly one wrapper.

use crate::error::LoadError;
use crate::store::Record;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// The document layout of a collection file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileShape {
    /// Top level is the array of records.
    Flat,
    /// Top level is an array of wrapper objects; the named field of each holds records.
    Enveloped(&'static str),
}

/// Decodes a whole collection file.
///
/// Blank input and a top-level `null` decode to an empty collection. Any record that fails to
/// deserialize fails the whole document.
pub fn decode<R: Record>(raw: &str) -> Result<Vec<R>, LoadError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut document: Value =
        serde_json::from_str(raw).map_err(|e| LoadError::Deserialization(e.to_string()))?;
    strip_nulls(&mut document);

    let values = match R::SHAPE {
        FileShape::Flat => flat_values(document)?,
        FileShape::Enveloped(field) => enveloped_values(document, field)?,
    };

    values
        .into_iter()
        .map(|value| {
            serde_json::from_value(value).map_err(|e| LoadError::Deserialization(e.to_string()))
        })
        .collect()
}

/// Encodes a whole collection in its canonical shape.
pub fn encode<R: Record>(records: &[R]) -> serde_json::Result<String> {
    match R::SHAPE {
        FileShape::Flat => serde_json::to_string_pretty(records),
        FileShape::Enveloped(field) => {
            serde_json::to_string_pretty(&[Envelope { field, records }])
        }
    }
}

fn flat_values(document: Value) -> Result<Vec<Value>, LoadError> {
    match document {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        other => Err(LoadError::UnexpectedShape(format!(
            "expected an array of records, found {}",
            describe(&other)
        ))),
    }
}

fn enveloped_values(document: Value, field: &str) -> Result<Vec<Value>, LoadError> {
    match document {
        Value::Null => Ok(Vec::new()),
        Value::Array(wrappers) => {
            let mut values = Vec::new();
            for wrapper in wrappers {
                values.extend(wrapper_records(wrapper, field)?);
            }
            Ok(values)
        }
        // Older writers produced a single wrapper object instead of an array of them.
        wrapper @ Value::Object(_) => wrapper_records(wrapper, field),
        other => Err(LoadError::UnexpectedShape(format!(
            "expected an array of '{field}' wrappers, found {}",
            describe(&other)
        ))),
    }
}

fn wrapper_records(wrapper: Value, field: &str) -> Result<Vec<Value>, LoadError> {
    match wrapper {
        Value::Null => Ok(Vec::new()),
        Value::Object(mut map) => match map.remove(field) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(LoadError::UnexpectedShape(format!(
                "expected '{field}' to be an array, found {}",
                describe(&other)
            ))),
        },
        other => Err(LoadError::UnexpectedShape(format!(
            "expected a '{field}' wrapper object, found {}",
            describe(&other)
        ))),
    }
}

/// Removes object members whose value is `null`, recursively.
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, member| !member.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A single wrapper object `{ "<field>": [records] }`.
struct Envelope<'a, R> {
    field: &'static str,
    records: &'a [R],
}

impl<R: Serialize> Serialize for Envelope<'_, R> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.field, self.records)?;
        map.end()
    }
}

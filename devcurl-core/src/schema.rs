// Structural schema inference over JSON values
//
// Arrays are described by their first element only. Later elements are not
// inspected, so `[1, "a"]` is `[number]`.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const EMPTY_ARRAY: &str = "array(empty)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Number,
    Boolean,
    Null,
}

impl Primitive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
            Primitive::Null => "null",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(Primitive::String),
            "number" => Some(Primitive::Number),
            "boolean" => Some(Primitive::Boolean),
            "null" => Some(Primitive::Null),
            _ => None,
        }
    }
}

/// Inferred shape of a JSON value.
///
/// Serialized as a primitive tag (`"number"`), `"array(empty)"`,
/// `{"_type": "array", "_items": ...}` or an object of field schemas.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Primitive(Primitive),
    /// Non-empty array; `None` when the first element is `null`
    Array(Option<Box<Schema>>),
    EmptyArray,
    /// Fields in their original order
    Object(Vec<(String, Schema)>),
}

/// Infer a schema for a JSON value. `null` has no schema.
pub fn infer(value: &Value) -> Option<Schema> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(match items.first() {
            None => Schema::EmptyArray,
            Some(first) => Schema::Array(infer(first).map(Box::new)),
        }),
        Value::Object(fields) => Some(Schema::Object(
            fields
                .iter()
                .map(|(key, field)| {
                    let schema = infer(field).unwrap_or(Schema::Primitive(Primitive::Null));
                    (key.clone(), schema)
                })
                .collect(),
        )),
        Value::String(_) => Some(Schema::Primitive(Primitive::String)),
        Value::Number(_) => Some(Schema::Primitive(Primitive::Number)),
        Value::Bool(_) => Some(Schema::Primitive(Primitive::Boolean)),
    }
}

/// Parse JSON text and infer its schema; `None` for invalid JSON or `null`
pub fn parse_and_infer(text: &str) -> Option<Schema> {
    if text.is_empty() {
        return None;
    }
    serde_json::from_str::<Value>(text).ok().and_then(|v| infer(&v))
}

impl Schema {
    /// Compact one-line rendering, e.g. `{ id: number, tags: [string], owner: {...} }`
    pub fn summary(&self) -> String {
        match self {
            Schema::Primitive(p) => p.as_str().to_string(),
            Schema::EmptyArray => EMPTY_ARRAY.to_string(),
            Schema::Array(items) => format!("[{}]", summary_of(items.as_deref())),
            Schema::Object(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(key, field)| match field {
                        Schema::Object(_) => format!("{}: {{...}}", key),
                        other => format!("{}: {}", key, other.summary()),
                    })
                    .collect();
                format!("{{ {} }}", parts.join(", "))
            }
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Rebuild a schema from its serialized form
    pub fn from_value(value: &Value) -> Option<Schema> {
        match value {
            Value::String(tag) if tag == EMPTY_ARRAY => Some(Schema::EmptyArray),
            Value::String(tag) => Primitive::from_tag(tag).map(Schema::Primitive),
            Value::Object(fields)
                if fields.get("_type").and_then(Value::as_str) == Some("array") =>
            {
                let items = fields
                    .get("_items")
                    .and_then(Schema::from_value)
                    .map(Box::new);
                Some(Schema::Array(items))
            }
            Value::Object(fields) => fields
                .iter()
                .map(|(key, field)| Schema::from_value(field).map(|s| (key.clone(), s)))
                .collect::<Option<Vec<_>>>()
                .map(Schema::Object),
            _ => None,
        }
    }
}

/// Summary of an optional schema, `null` when absent
pub fn summary_of(schema: Option<&Schema>) -> String {
    schema.map(Schema::summary).unwrap_or_else(|| "null".to_string())
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Schema::Primitive(p) => serializer.serialize_str(p.as_str()),
            Schema::EmptyArray => serializer.serialize_str(EMPTY_ARRAY),
            Schema::Array(items) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("_type", "array")?;
                map.serialize_entry("_items", items)?;
                map.end()
            }
            Schema::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, field) in fields {
                    map.serialize_entry(key, field)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Schema::from_value(&value)
            .ok_or_else(|| de::Error::custom(format!("not a schema: {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary() {
        let schema = infer(&json!({
            "id": 1,
            "tags": ["a"],
            "owner": {"name": "x"},
            "empty": [],
            "gone": null
        }))
        .unwrap();
        assert_eq!(
            schema.summary(),
            "{ id: number, tags: [string], owner: {...}, empty: array(empty), gone: null }"
        );
    }

    #[test]
    fn test_summary_of_array_of_nulls() {
        let schema = infer(&json!([null, 1])).unwrap();
        assert_eq!(schema, Schema::Array(None));
        assert_eq!(schema.summary(), "[null]");
    }

    #[test]
    fn test_from_value_rejects_unknown_tags() {
        assert_eq!(Schema::from_value(&json!("integer")), None);
        assert_eq!(Schema::from_value(&json!(3)), None);
    }
}

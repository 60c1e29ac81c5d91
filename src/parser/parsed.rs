//! Parsed message facade: a decoded payload paired with its schema model.

use super::path::FieldPath;
use crate::schema::{FieldKind, SchemaModel};
use crate::{ConvertError, ConvertResult, Value};
use std::sync::Arc;

/// One decoded payload plus the schema model used to decode it
///
/// Created per input message by the message parser and discarded once the
/// batch converter has built a record from it. Field values are already
/// normalized at decode time, so [`ParsedMessage::flatten`] is a cheap,
/// idempotent view and path resolution only has to walk, never convert.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    schema: Arc<SchemaModel>,
    /// Present top-level fields in schema declaration order
    fields: Vec<(String, Value)>,
}

impl ParsedMessage {
    pub(crate) fn new(schema: Arc<SchemaModel>, fields: Vec<(String, Value)>) -> Self {
        Self { schema, fields }
    }

    /// The schema model this message was decoded under
    pub fn schema(&self) -> &Arc<SchemaModel> {
        &self.schema
    }

    /// Every present top-level field with conversions applied
    ///
    /// Fields absent from the payload that carry no wire default (nested
    /// messages, well-known types, repeated fields) are omitted entirely;
    /// they are never present with a null placeholder.
    pub fn flatten(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Consume the message, yielding its flattened field mapping
    pub fn into_fields(self) -> Vec<(String, Value)> {
        self.fields
    }

    /// Resolve a dotted, optionally indexed field path
    ///
    /// Returns the zero/default value for unset primitive and enum fields,
    /// `None` for unset well-known types and nested messages, and an
    /// invalid-field-path error when the path does not fit the schema
    /// (unknown segment, index on a non-repeated field, descending through
    /// a scalar).
    pub fn get(&self, path: &str) -> ConvertResult<Option<Value>> {
        let parsed = FieldPath::parse(path)?;
        let segments = parsed.segments();
        let mut model: &SchemaModel = &self.schema;
        let mut fields: &[(String, Value)] = &self.fields;

        for (pos, segment) in segments.iter().enumerate() {
            let descriptor = model.field(&segment.name).ok_or_else(|| {
                ConvertError::invalid_path(
                    path,
                    format!("no field '{}' in schema '{}'", segment.name, model.name()),
                )
            })?;

            let value = fields
                .iter()
                .find(|(n, _)| n == &segment.name)
                .map(|(_, v)| v);

            // Apply the optional repeated-field index
            let element: Option<&Value> = match segment.index {
                None => value,
                Some(index) => {
                    if !descriptor.repeated {
                        return Err(ConvertError::invalid_path(
                            path,
                            format!("field '{}' is not repeated", segment.name),
                        ));
                    }
                    let items = match value {
                        Some(Value::Array(items)) => items.as_slice(),
                        _ => &[],
                    };
                    Some(items.get(index).ok_or_else(|| {
                        ConvertError::invalid_path(
                            path,
                            format!(
                                "index {} out of range for field '{}' (length {})",
                                index,
                                segment.name,
                                items.len()
                            ),
                        )
                    })?)
                }
            };

            if pos == segments.len() - 1 {
                return Ok(match element {
                    Some(v) => Some(v.clone()),
                    None if descriptor.repeated => Some(Value::Array(Vec::new())),
                    None => descriptor.kind.default_value(),
                });
            }

            // Descend: only message-like kinds have sub-fields
            let nested = descriptor.kind.nested().ok_or_else(|| {
                ConvertError::invalid_path(
                    path,
                    format!(
                        "field '{}' is a {}, not a message",
                        segment.name,
                        descriptor.kind.name()
                    ),
                )
            })?;
            if descriptor.repeated && segment.index.is_none() {
                let what = if matches!(descriptor.kind, FieldKind::Map(_)) {
                    "map"
                } else {
                    "repeated"
                };
                return Err(ConvertError::invalid_path(
                    path,
                    format!("{} field '{}' requires an index", what, segment.name),
                ));
            }

            model = nested;
            fields = match element {
                Some(Value::Record(f)) => f.as_slice(),
                Some(other) => {
                    return Err(ConvertError::invalid_path(
                        path,
                        format!(
                            "field '{}' did not decode as a message (got {})",
                            segment.name,
                            kind_of(other)
                        ),
                    ));
                }
                // Unset nested message: keep walking against an empty
                // record so the leaf resolves to its default
                None => &[],
            };
        }

        unreachable!("empty paths are rejected by FieldPath::parse")
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "boolean",
        Value::Integer(_) => "integer",
        Value::Float(_) => "float",
        Value::String(_) => "string",
        Value::Bytes(_) => "bytes",
        Value::Timestamp(_) => "timestamp",
        Value::Duration { .. } => "duration",
        Value::Array(_) => "array",
        Value::Record(_) => "record",
    }
}

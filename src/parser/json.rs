//! Schemaless JSON parsing mode.
//!
//! Decodes a payload as a JSON object of scalars. Nested objects and arrays
//! are rejected by default; the original connectors treated flat JSON as the
//! contract and routed nested payloads to the dead letter path, so nesting
//! is an opt-in policy here rather than the default.

use crate::schema::{FieldDescriptor, FieldKind, SchemaModel};
use crate::{ConvertError, ConvertResult, Value};
use std::sync::Arc;

/// Decode a JSON payload into a flattened field mapping
pub(crate) fn decode(payload: &[u8], allow_nested: bool) -> ConvertResult<Vec<(String, Value)>> {
    let parsed: serde_json::Value = serde_json::from_slice(payload)
        .map_err(|e| ConvertError::decoding_with_source("payload is not valid JSON", e))?;

    let serde_json::Value::Object(map) = parsed else {
        return Err(ConvertError::decoding(format!(
            "JSON payload must be an object, got {}",
            json_type(&parsed)
        )));
    };

    let mut fields = Vec::with_capacity(map.len());
    for (name, value) in map {
        if !allow_nested && matches!(value, serde_json::Value::Object(_) | serde_json::Value::Array(_))
        {
            return Err(ConvertError::Unsupported(format!(
                "field '{}' is a nested {}, flat JSON mode accepts scalars only",
                name,
                json_type(&value)
            )));
        }
        fields.push((name, Value::from(value)));
    }
    Ok(fields)
}

/// Build a synthetic schema model from a decoded JSON object, so path
/// resolution and flattening work uniformly across parsing modes
pub(crate) fn infer_model(
    name: &str,
    fields: &[(String, Value)],
) -> ConvertResult<Arc<SchemaModel>> {
    let mut descriptors = Vec::with_capacity(fields.len());
    for (number, (field_name, value)) in fields.iter().enumerate() {
        let (kind, repeated) = infer_kind(field_name, value)?;
        let mut descriptor = FieldDescriptor::new(field_name.clone(), number as u32 + 1, kind);
        if repeated {
            descriptor = descriptor.repeated();
        }
        descriptors.push(descriptor);
    }
    Ok(Arc::new(SchemaModel::new(name, descriptors)?))
}

fn infer_kind(name: &str, value: &Value) -> ConvertResult<(FieldKind, bool)> {
    Ok(match value {
        Value::Bool(_) => (FieldKind::Boolean, false),
        Value::Integer(_) => (FieldKind::Long, false),
        Value::Float(_) => (FieldKind::Double, false),
        Value::String(_) => (FieldKind::String, false),
        Value::Bytes(_) => (FieldKind::Bytes, false),
        Value::Timestamp(_) => (FieldKind::Timestamp, false),
        Value::Duration { .. } => (FieldKind::Duration, false),
        Value::Record(nested) => (
            FieldKind::Message(infer_model(name, nested)?),
            false,
        ),
        Value::Array(items) => {
            let element = items.first().cloned().unwrap_or(Value::String(String::new()));
            let (kind, nested_repeated) = infer_kind(name, &element)?;
            if nested_repeated {
                return Err(ConvertError::Unsupported(format!(
                    "field '{name}' nests arrays inside arrays"
                )));
            }
            (kind, true)
        }
    })
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

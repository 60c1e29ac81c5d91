//! HTTP endpoint record builder.

use crate::convert::RecordBuilder;
use crate::parser::ParsedMessage;
use crate::{ConvertResult, Message, Value};

/// Default output field carrying the serialized request body
pub const BODY_FIELD: &str = "body";

/// Builds one HTTP request body per message: the flattened message
/// serialized as a JSON object under a single output field
///
/// The HTTP adapter reads that field and posts it as-is; headers, URL, and
/// method belong to the adapter, not the record.
#[derive(Debug, Clone)]
pub struct HttpRecordBuilder {
    body_field: String,
}

impl Default for HttpRecordBuilder {
    fn default() -> Self {
        Self {
            body_field: BODY_FIELD.to_string(),
        }
    }
}

impl HttpRecordBuilder {
    /// Create a builder writing the body under the default field name
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with a custom body field name
    pub fn with_body_field(body_field: impl Into<String>) -> Self {
        Self {
            body_field: body_field.into(),
        }
    }
}

impl RecordBuilder for HttpRecordBuilder {
    fn build(
        &self,
        parsed: &ParsedMessage,
        _message: &Message,
    ) -> ConvertResult<Vec<(String, Value)>> {
        let body = Value::Record(parsed.flatten().to_vec()).to_json()?.to_string();
        Ok(vec![(self.body_field.clone(), Value::String(body))])
    }
}

//! Message parsing: payload selection, schema resolution, decoding.

mod json;
mod parsed;
mod path;
mod proto;

pub use parsed::ParsedMessage;
pub use path::{FieldPath, PathSegment};

use crate::config::{ConverterConfig, InputFormat, ParseMode};
use crate::schema::{SchemaCache, SchemaModel, SchemaRegistry};
use crate::{ConvertError, ConvertResult, Message};
use std::sync::Arc;
use tracing::trace;

/// Decodes raw payloads into [`ParsedMessage`]s
///
/// Holds the only long-lived shared state in the core: the schema model
/// cache. Parsing itself is synchronous and stateless per call, so one
/// parser can serve concurrent batch conversions.
pub struct MessageParser {
    registry: Arc<dyn SchemaRegistry>,
    cache: SchemaCache,
    mode: ParseMode,
    format: InputFormat,
    allow_unknown_fields: bool,
    allow_nested_json: bool,
}

impl MessageParser {
    /// Create a parser bound to a registry and configuration
    pub fn new(registry: Arc<dyn SchemaRegistry>, config: &ConverterConfig) -> Self {
        Self {
            registry,
            cache: SchemaCache::new(),
            mode: config.parse_mode,
            format: config.input_format,
            allow_unknown_fields: config.allow_unknown_fields,
            allow_nested_json: config.allow_nested_json,
        }
    }

    /// Resolve a schema name to its compiled model, building and caching it
    /// on first use
    pub fn resolve_schema(&self, schema_name: &str) -> ConvertResult<Arc<SchemaModel>> {
        self.cache.resolve(schema_name, self.registry.as_ref())
    }

    /// Parse one message into a typed, addressable view
    pub fn parse(&self, message: &Message, schema_name: &str) -> ConvertResult<ParsedMessage> {
        let payload = self.select_payload(message)?;
        trace!(
            schema = schema_name,
            bytes = payload.len(),
            "parsing payload"
        );

        match self.format {
            InputFormat::Proto => {
                let model = self.resolve_schema(schema_name)?;
                let fields = proto::decode(&model, payload, self.allow_unknown_fields)?;
                Ok(ParsedMessage::new(model, fields))
            }
            InputFormat::Json => {
                let fields = json::decode(payload, self.allow_nested_json)?;
                let model = json::infer_model(schema_name, &fields)?;
                Ok(ParsedMessage::new(model, fields))
            }
        }
    }

    /// Pick the configured payload half, failing with an empty-message
    /// error (distinct from malformed bytes) when it is absent or empty
    fn select_payload<'a>(&self, message: &'a Message) -> ConvertResult<&'a [u8]> {
        let (bytes, half) = match self.mode {
            ParseMode::Key => (message.key.as_deref(), "key"),
            ParseMode::Value => (message.value.as_deref(), "value"),
        };
        match bytes {
            Some(b) if !b.is_empty() => Ok(b),
            _ => Err(ConvertError::EmptyMessage(format!(
                "{half} bytes absent or empty for {} parse mode",
                self.mode
            ))),
        }
    }
}

//! Key/value cache record builder.

use crate::builders::template::Template;
use crate::convert::RecordBuilder;
use crate::parser::ParsedMessage;
use crate::{ConvertError, ConvertResult, Message, Value};

/// Output field carrying the rendered cache key
pub const KEY_FIELD: &str = "key";
/// Output field carrying the serialized cache value
pub const VALUE_FIELD: &str = "value";

/// Builds key/value pairs: a templated key and a JSON value
///
/// The value is either the whole flattened message serialized as a JSON
/// object, or a single projected field when one is configured.
#[derive(Debug, Clone)]
pub struct KvRecordBuilder {
    key: Template,
    value_field: Option<String>,
}

impl KvRecordBuilder {
    /// Create a builder whose value is the whole message as JSON
    pub fn new(key_template: &str) -> ConvertResult<Self> {
        Ok(Self {
            key: Template::parse(key_template)?,
            value_field: None,
        })
    }

    /// Create a builder whose value is a single projected field
    pub fn with_value_field(key_template: &str, field_path: impl Into<String>) -> ConvertResult<Self> {
        Ok(Self {
            key: Template::parse(key_template)?,
            value_field: Some(field_path.into()),
        })
    }
}

impl RecordBuilder for KvRecordBuilder {
    fn build(
        &self,
        parsed: &ParsedMessage,
        _message: &Message,
    ) -> ConvertResult<Vec<(String, Value)>> {
        let key = self.key.render(parsed)?;
        if key.is_empty() {
            return Err(ConvertError::Build(format!(
                "key template '{}' rendered an empty key",
                self.key.raw()
            )));
        }

        let value = match &self.value_field {
            Some(path) => parsed
                .get(path)?
                .unwrap_or_else(|| Value::String(String::new()))
                .render(),
            None => Value::Record(parsed.flatten().to_vec()).to_json()?.to_string(),
        };

        Ok(vec![
            (KEY_FIELD.to_string(), Value::String(key)),
            (VALUE_FIELD.to_string(), Value::String(value)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConverterConfig;
    use crate::parser::MessageParser;
    use crate::schema::{FieldDecl, InMemoryRegistry, SchemaDescriptor, TypeName};
    use std::sync::Arc;

    fn parsed_person() -> (ParsedMessage, Message) {
        let mut registry = InMemoryRegistry::new();
        registry.register(SchemaDescriptor::new(
            "Person",
            vec![
                FieldDecl::new("first_name", 1, TypeName::String),
                FieldDecl::new("age", 2, TypeName::Integer),
            ],
        ));
        let config = ConverterConfig {
            schema_name: Some("Person".to_string()),
            ..ConverterConfig::default()
        };
        let parser = MessageParser::new(Arc::new(registry), &config);
        let msg = Message::with_value(&[0x0a, 0x03, b'a', b'n', b'n', 0x10, 30][..]);
        let parsed = parser.parse(&msg, "Person").unwrap();
        (parsed, msg)
    }

    #[test]
    fn test_whole_message_value() {
        let (parsed, msg) = parsed_person();
        let builder = KvRecordBuilder::new("person:{first_name}").unwrap();
        let fields = builder.build(&parsed, &msg).unwrap();

        assert_eq!(
            fields[0],
            (KEY_FIELD.to_string(), Value::String("person:ann".into()))
        );
        let body = fields[1].1.as_str().unwrap();
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["first_name"], "ann");
        assert_eq!(json["age"], 30);
    }

    #[test]
    fn test_single_field_value() {
        let (parsed, msg) = parsed_person();
        let builder = KvRecordBuilder::with_value_field("person:{first_name}", "age").unwrap();
        let fields = builder.build(&parsed, &msg).unwrap();
        assert_eq!(fields[1], (VALUE_FIELD.to_string(), Value::String("30".into())));
    }

    #[test]
    fn test_empty_rendered_key_rejected() {
        let (parsed, msg) = parsed_person();
        // "nickname" is not in the schema, and a pure-placeholder template
        // over an unset string would render empty
        let builder = KvRecordBuilder::new("{first_name}").unwrap();
        assert!(builder.build(&parsed, &msg).is_ok());

        let mut registry = InMemoryRegistry::new();
        registry.register(SchemaDescriptor::new(
            "Person",
            vec![FieldDecl::new("first_name", 1, TypeName::String)],
        ));
        let config = ConverterConfig {
            schema_name: Some("Person".to_string()),
            ..ConverterConfig::default()
        };
        let parser = MessageParser::new(Arc::new(registry), &config);
        let empty_name = Message::with_value(&[0x0a, 0x00][..]);
        let parsed = parser.parse(&empty_name, "Person").unwrap();
        let err = builder.build(&parsed, &empty_name).unwrap_err();
        assert!(matches!(err, ConvertError::Build(_)));
    }
}

//! Integration test for end-to-end batch conversion
//!
//! Exercises the full pipeline through the public API: parsing in both
//! formats, partial-failure partitioning, error classification, and path
//! resolution - without any backend client.

use sinkbridge_core::builders::TableRecordBuilder;
use sinkbridge_core::config::{ConverterConfig, InputFormat, ParseMode};
use sinkbridge_core::convert::BatchConverter;
use sinkbridge_core::parser::MessageParser;
use sinkbridge_core::schema::{FieldDecl, InMemoryRegistry, SchemaDescriptor, TypeName};
use sinkbridge_core::{ErrorKind, Message, Value};
use std::sync::Arc;

fn person_registry() -> InMemoryRegistry {
    let mut registry = InMemoryRegistry::new();
    registry.register(SchemaDescriptor::new(
        "Person",
        vec![
            FieldDecl::new("first_name", 1, TypeName::String),
            FieldDecl::new("age", 2, TypeName::Integer),
        ],
    ));
    registry
}

fn converter(config: ConverterConfig) -> BatchConverter<TableRecordBuilder> {
    let parser = MessageParser::new(Arc::new(person_registry()), &config);
    BatchConverter::new(parser, TableRecordBuilder::new(), config).unwrap()
}

// field 1 ("first_name") = "ann", field 2 ("age") = 30
const PERSON: &[u8] = &[0x0a, 0x03, b'a', b'n', b'n', 0x10, 30];
// PERSON plus undeclared field 3 (varint 7)
const PERSON_EXTRA: &[u8] = &[0x0a, 0x03, b'a', b'n', b'n', 0x10, 30, 0x18, 7];

#[test]
fn json_batch_partitions_by_failure_class() {
    let config = ConverterConfig {
        input_format: InputFormat::Json,
        ..ConverterConfig::default()
    };
    let converter = converter(config);

    let batch = vec![
        Message::with_value(&br#"{"first_name":"john doe"}"#[..]),
        Message::with_value(&br#"{ invalid json"#[..]),
        Message::with_value(&br#"{"last_name":"walker"}"#[..]),
        Message::with_value(&br#"not json"#[..]),
        Message::with_value(&br#"{"nested":{"a":1}}"#[..]),
    ];

    let records = converter.convert(&batch);
    assert_eq!(records.len(), 5);

    let valid_indices: Vec<usize> = records.valid.iter().map(|r| r.index).collect();
    assert_eq!(valid_indices, vec![0, 2]);
    assert_eq!(
        records.valid[0].field("first_name"),
        Some(&Value::String("john doe".into()))
    );
    assert_eq!(
        records.valid[1].field("last_name"),
        Some(&Value::String("walker".into()))
    );

    let kind_of = |index: usize| {
        records
            .invalid
            .iter()
            .find(|r| r.index == index)
            .and_then(|r| r.error.as_ref())
            .map(|e| e.kind)
            .unwrap()
    };
    assert_eq!(kind_of(1), ErrorKind::Deserialization);
    assert_eq!(kind_of(3), ErrorKind::Deserialization);
    assert_eq!(kind_of(4), ErrorKind::InvalidMessage);
}

#[test]
fn missing_key_in_key_mode_is_invalid_message() {
    let config = ConverterConfig {
        schema_name: Some("Person".to_string()),
        parse_mode: ParseMode::Key,
        ..ConverterConfig::default()
    };
    let converter = converter(config);

    let records = converter.convert(&[Message::with_value(PERSON)]);
    assert_eq!(
        records.invalid[0].error.as_ref().unwrap().kind,
        ErrorKind::InvalidMessage
    );
}

#[test]
fn unknown_field_policy_strict_and_lenient() {
    let strict = converter(ConverterConfig {
        schema_name: Some("Person".to_string()),
        allow_unknown_fields: false,
        ..ConverterConfig::default()
    });
    let records = strict.convert(&[Message::with_value(PERSON_EXTRA)]);
    assert_eq!(
        records.invalid[0].error.as_ref().unwrap().kind,
        ErrorKind::UnknownFields
    );

    let lenient = converter(ConverterConfig {
        schema_name: Some("Person".to_string()),
        allow_unknown_fields: true,
        ..ConverterConfig::default()
    });
    let records = lenient.convert(&[Message::with_value(PERSON_EXTRA)]);
    let record = &records.valid[0];
    assert_eq!(record.fields.len(), 2);
    assert_eq!(record.field("age"), Some(&Value::Integer(30)));
}

#[test]
fn flatten_and_path_resolution_agree_on_every_declared_scalar() {
    let config = ConverterConfig {
        schema_name: Some("Person".to_string()),
        ..ConverterConfig::default()
    };
    let parser = MessageParser::new(Arc::new(person_registry()), &config);

    // Payload carries only first_name; age is wire-absent
    let partial: &[u8] = &[0x0a, 0x03, b'a', b'n', b'n'];
    let parsed = parser
        .parse(&Message::with_value(partial), "Person")
        .unwrap();

    // Unset scalars flatten to their wire default instead of vanishing
    let flat = parsed.flatten();
    assert_eq!(flat.len(), parsed.schema().fields().len());
    assert!(flat.contains(&("age".to_string(), Value::Integer(0))));

    for (name, value) in flat {
        assert_eq!(parsed.get(name).unwrap().as_ref(), Some(value));
    }
}

#[test]
fn path_through_scalar_identifies_the_path() {
    let config = ConverterConfig {
        schema_name: Some("Person".to_string()),
        ..ConverterConfig::default()
    };
    let parser = MessageParser::new(Arc::new(person_registry()), &config);
    let parsed = parser
        .parse(&Message::with_value(PERSON), "Person")
        .unwrap();

    let err = parsed.get("age.b").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownFields);
    assert!(err.to_string().contains("age.b"));
}

#[test]
fn map_fields_flatten_to_ordered_entries() {
    let mut registry = InMemoryRegistry::new();
    registry.register(SchemaDescriptor::new(
        "Tagged",
        vec![FieldDecl::map(
            "labels",
            1,
            TypeName::String,
            TypeName::String,
        )],
    ));
    let config = ConverterConfig {
        schema_name: Some("Tagged".to_string()),
        ..ConverterConfig::default()
    };
    let parser = MessageParser::new(Arc::new(registry), &config);

    // two map entries in wire order: {k1: v1}, {k2: v2}
    let payload: &[u8] = &[
        0x0a, 0x08, 0x0a, 0x02, b'k', b'1', 0x12, 0x02, b'v', b'1', // entry 1
        0x0a, 0x08, 0x0a, 0x02, b'k', b'2', 0x12, 0x02, b'v', b'2', // entry 2
    ];
    let parsed = parser.parse(&Message::with_value(payload), "Tagged").unwrap();

    let entry = |key: &str, value: &str| {
        Value::Record(vec![
            ("key".to_string(), Value::String(key.into())),
            ("value".to_string(), Value::String(value.into())),
        ])
    };
    assert_eq!(
        parsed.get("labels").unwrap(),
        Some(Value::Array(vec![entry("k1", "v1"), entry("k2", "v2")]))
    );
}

#[test]
fn single_bad_message_never_poisons_neighbors() {
    let config = ConverterConfig {
        schema_name: Some("Person".to_string()),
        ..ConverterConfig::default()
    };
    let converter = converter(config);

    let batch = vec![
        Message::with_value(PERSON),
        Message::with_value(&[0x0a, 0x7f][..]), // announces 127 bytes, has none
        Message::with_value(PERSON),
    ];
    let records = converter.convert(&batch);

    assert_eq!(records.valid.len(), 2);
    assert_eq!(records.invalid_indices(), vec![1]);
    for record in &records.valid {
        assert_eq!(record.field("first_name"), Some(&Value::String("ann".into())));
    }
}

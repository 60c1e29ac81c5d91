//! Batch conversion with partial-failure semantics.
//!
//! Applies parsing plus a sink-specific record builder to every message in
//! a batch independently. Failures are classified into the error taxonomy
//! and isolated per message: a bad message at index i never affects the
//! outcome at index j. Every input message yields exactly one record.

use crate::config::{ConverterConfig, MetadataColumnType, MetadataSettings};
use crate::metrics::ConverterMetrics;
use crate::parser::{MessageParser, ParsedMessage};
use crate::{ConvertError, ConvertResult, Message, Record, Records, Value};
use chrono::{TimeZone, Utc};
use std::time::Instant;
use tracing::debug;

/// Builds sink-specific output fields from a parsed message
///
/// One implementation per backend; the batch converter is generic over
/// this seam and owns everything backend-independent (metadata projection,
/// timestamp injection, error classification).
pub trait RecordBuilder: Send + Sync {
    /// Build the output field mapping for one successfully parsed message
    fn build(
        &self,
        parsed: &ParsedMessage,
        message: &Message,
    ) -> ConvertResult<Vec<(String, Value)>>;
}

/// One requested destination-schema addition
///
/// Produced by [`schema_evolution_request`] for schema-flexible backends
/// after the sink reports missing-field failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Output field name
    pub name: String,
    /// Inferred destination type: string unless the field is a declared
    /// metadata column with its own type
    pub inferred_type: MetadataColumnType,
}

/// Converts batches of messages into position-preserving record sets
pub struct BatchConverter<B: RecordBuilder> {
    parser: MessageParser,
    builder: B,
    config: ConverterConfig,
    metrics: Option<ConverterMetrics>,
}

impl<B: RecordBuilder> BatchConverter<B> {
    /// Create a converter from a parser, a sink-specific builder, and
    /// validated configuration
    pub fn new(parser: MessageParser, builder: B, config: ConverterConfig) -> ConvertResult<Self> {
        config.validate()?;
        Ok(Self {
            parser,
            builder,
            config,
            metrics: None,
        })
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: ConverterMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Convert a whole batch
    ///
    /// Always returns a complete result: `valid.len() + invalid.len()`
    /// equals the batch length and the indices across both collections are
    /// exactly `0..batch.len()`. The converter never retries internally;
    /// callers resubmit a narrowed batch of failed indices if they want to.
    pub fn convert(&self, batch: &[Message]) -> Records {
        let start = Instant::now();
        let mut records = Records::default();

        // Iterations only read shared immutable state (schema cache,
        // config) and write a private slot, so they stay independent.
        for (index, message) in batch.iter().enumerate() {
            match self.convert_one(message) {
                Ok(fields) => {
                    records
                        .valid
                        .push(Record::valid(index, message.metadata.clone(), fields));
                    if let Some(m) = &self.metrics {
                        m.record_success();
                    }
                }
                Err(e) => {
                    debug!(index, error = %e, "message failed conversion");
                    if let Some(m) = &self.metrics {
                        m.record_error(e.kind());
                    }
                    records.invalid.push(Record::invalid(
                        index,
                        message.metadata.clone(),
                        e.descriptor(),
                    ));
                }
            }
        }

        if let Some(m) = &self.metrics {
            m.record_batch(batch.len(), records.valid.len(), start.elapsed());
        }
        records
    }

    fn convert_one(&self, message: &Message) -> ConvertResult<Vec<(String, Value)>> {
        let parsed = self.parser.parse(message, self.config.schema_name())?;
        let mut fields = self.builder.build(&parsed, message)?;

        self.append_metadata(message, &mut fields)?;

        // Injected only on successful builds; invalid records never carry it
        if self.config.event_timestamp.inject {
            fields.push((
                self.config.event_timestamp.field.clone(),
                Value::Timestamp(Utc::now()),
            ));
        }
        Ok(fields)
    }

    /// Project configured metadata keys into output fields, flat or nested
    /// under the configured namespace
    fn append_metadata(
        &self,
        message: &Message,
        fields: &mut Vec<(String, Value)>,
    ) -> ConvertResult<()> {
        let settings = &self.config.metadata;
        if settings.columns.is_empty() {
            return Ok(());
        }

        let mut projected = Vec::with_capacity(settings.columns.len());
        for column in &settings.columns {
            let Some(raw) = message.metadata_value(&column.name) else {
                debug!(column = %column.name, "metadata key absent, skipping");
                continue;
            };
            projected.push((column.name.clone(), convert_metadata(raw, column)?));
        }

        if settings.namespace.is_empty() {
            fields.extend(projected);
        } else {
            fields.push((settings.namespace.clone(), Value::Record(projected)));
        }
        Ok(())
    }
}

fn convert_metadata(
    raw: &str,
    column: &crate::config::MetadataColumn,
) -> ConvertResult<Value> {
    Ok(match column.column_type {
        MetadataColumnType::String => Value::String(raw.to_string()),
        MetadataColumnType::Integer => Value::Integer(raw.parse().map_err(|_| {
            ConvertError::Build(format!(
                "metadata column '{}': '{}' is not an integer",
                column.name, raw
            ))
        })?),
        MetadataColumnType::Timestamp => {
            let millis: i64 = raw.parse().map_err(|_| {
                ConvertError::Build(format!(
                    "metadata column '{}': '{}' is not epoch milliseconds",
                    column.name, raw
                ))
            })?;
            match Utc.timestamp_millis_opt(millis) {
                chrono::LocalResult::Single(ts) => Value::Timestamp(ts),
                _ => {
                    return Err(ConvertError::Build(format!(
                        "metadata column '{}': {} is out of timestamp range",
                        column.name, millis
                    )))
                }
            }
        }
    })
}

/// Build a schema-evolution request from the affected records
///
/// Inspects the output field mappings of records the backend rejected for
/// missing destination fields, and produces one [`FieldSpec`] per distinct
/// field name in first-seen order. The inferred type defaults to string
/// unless the name is a declared metadata column carrying its own type.
pub fn schema_evolution_request(
    affected: &[Record],
    metadata: &MetadataSettings,
) -> Vec<FieldSpec> {
    let mut specs: Vec<FieldSpec> = Vec::new();
    for record in affected {
        for (name, _) in &record.fields {
            if specs.iter().any(|s| &s.name == name) {
                continue;
            }
            let inferred_type = metadata
                .columns
                .iter()
                .find(|c| &c.name == name)
                .map(|c| c.column_type)
                .unwrap_or_default();
            specs.push(FieldSpec {
                name: name.clone(),
                inferred_type,
            });
        }
    }
    specs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EventTimestampSettings, InputFormat, MetadataColumn};
    use crate::message::metadata_keys;
    use crate::schema::InMemoryRegistry;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Builder that flattens every parsed field as-is
    struct Passthrough;

    impl RecordBuilder for Passthrough {
        fn build(
            &self,
            parsed: &ParsedMessage,
            _message: &Message,
        ) -> ConvertResult<Vec<(String, Value)>> {
            Ok(parsed.flatten().to_vec())
        }
    }

    fn json_converter(config: ConverterConfig) -> BatchConverter<Passthrough> {
        let parser = MessageParser::new(Arc::new(InMemoryRegistry::new()), &config);
        BatchConverter::new(parser, Passthrough, config).unwrap()
    }

    fn json_config() -> ConverterConfig {
        ConverterConfig {
            input_format: InputFormat::Json,
            ..ConverterConfig::default()
        }
    }

    #[test]
    fn test_totality_and_index_partition() {
        let converter = json_converter(json_config());
        let batch = vec![
            Message::with_value(&br#"{"a":1}"#[..]),
            Message::with_value(&br#"not json"#[..]),
            Message::with_value(&br#"{"b":2}"#[..]),
        ];

        let records = converter.convert(&batch);
        assert_eq!(records.len(), 3);

        let mut indices: Vec<usize> = records
            .valid
            .iter()
            .chain(&records.invalid)
            .map(|r| r.index)
            .collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_failure_isolation() {
        let converter = json_converter(json_config());
        let good = Message::with_value(&br#"{"a":1}"#[..]);
        let bad = Message::with_value(&br#"{"#[..]);

        let alone = converter.convert(&[good.clone()]);
        let mixed = converter.convert(&[bad, good]);

        let solo = &alone.valid[0];
        let with_bad_neighbor = mixed.valid.iter().find(|r| r.index == 1).unwrap();
        assert_eq!(solo.fields, with_bad_neighbor.fields);
    }

    #[test]
    fn test_metadata_projection_flat() {
        let mut config = json_config();
        config.metadata.columns = vec![
            MetadataColumn {
                name: metadata_keys::TOPIC.to_string(),
                column_type: MetadataColumnType::String,
            },
            MetadataColumn {
                name: metadata_keys::OFFSET.to_string(),
                column_type: MetadataColumnType::Integer,
            },
        ];
        let converter = json_converter(config);

        let msg = Message::with_value(&br#"{"a":1}"#[..])
            .with_metadata(metadata_keys::TOPIC, "orders")
            .with_metadata(metadata_keys::OFFSET, "42");
        let records = converter.convert(&[msg]);

        let record = &records.valid[0];
        assert_eq!(
            record.field(metadata_keys::TOPIC),
            Some(&Value::String("orders".into()))
        );
        assert_eq!(record.field(metadata_keys::OFFSET), Some(&Value::Integer(42)));
    }

    #[test]
    fn test_metadata_projection_namespaced() {
        let mut config = json_config();
        config.metadata.namespace = "meta".to_string();
        config.metadata.columns = vec![MetadataColumn {
            name: metadata_keys::TOPIC.to_string(),
            column_type: MetadataColumnType::String,
        }];
        let converter = json_converter(config);

        let msg =
            Message::with_value(&br#"{"a":1}"#[..]).with_metadata(metadata_keys::TOPIC, "orders");
        let records = converter.convert(&[msg]);

        let record = &records.valid[0];
        assert!(record.field(metadata_keys::TOPIC).is_none());
        assert_eq!(
            record.field("meta"),
            Some(&Value::Record(vec![(
                metadata_keys::TOPIC.to_string(),
                Value::String("orders".into())
            )]))
        );
    }

    #[test]
    fn test_bad_metadata_integer_is_default_error() {
        let mut config = json_config();
        config.metadata.columns = vec![MetadataColumn {
            name: metadata_keys::OFFSET.to_string(),
            column_type: MetadataColumnType::Integer,
        }];
        let converter = json_converter(config);

        let msg = Message::with_value(&br#"{"a":1}"#[..])
            .with_metadata(metadata_keys::OFFSET, "not-a-number");
        let records = converter.convert(&[msg]);

        assert_eq!(records.invalid.len(), 1);
        assert_eq!(
            records.invalid[0].error.as_ref().unwrap().kind,
            crate::ErrorKind::Default
        );
    }

    #[test]
    fn test_event_timestamp_on_valid_records_only() {
        let mut config = json_config();
        config.event_timestamp = EventTimestampSettings {
            inject: true,
            field: "received_at".to_string(),
        };
        let converter = json_converter(config);

        let batch = vec![
            Message::with_value(&br#"{"a":1}"#[..]),
            Message::with_value(&br#"nope"#[..]),
        ];
        let records = converter.convert(&batch);

        assert!(matches!(
            records.valid[0].field("received_at"),
            Some(Value::Timestamp(_))
        ));
        assert!(records.invalid[0].fields.is_empty());
    }

    #[test]
    fn test_invalid_record_keeps_metadata() {
        let converter = json_converter(json_config());
        let msg = Message::with_value(&br#"broken"#[..])
            .with_metadata(metadata_keys::TOPIC, "orders")
            .with_metadata(metadata_keys::PARTITION, "2");
        let records = converter.convert(&[msg]);

        let invalid = &records.invalid[0];
        assert_eq!(
            invalid.metadata.get(metadata_keys::TOPIC).map(String::as_str),
            Some("orders")
        );
    }

    #[test]
    fn test_evolution_request_types_and_dedup() {
        let metadata = MetadataSettings {
            namespace: String::new(),
            columns: vec![MetadataColumn {
                name: "message_offset".to_string(),
                column_type: MetadataColumnType::Integer,
            }],
        };
        let records = vec![
            Record::valid(
                0,
                HashMap::new(),
                vec![
                    ("name".to_string(), Value::String("x".into())),
                    ("message_offset".to_string(), Value::Integer(1)),
                ],
            ),
            Record::valid(
                1,
                HashMap::new(),
                vec![("name".to_string(), Value::String("y".into()))],
            ),
        ];

        let specs = schema_evolution_request(&records, &metadata);
        assert_eq!(
            specs,
            vec![
                FieldSpec {
                    name: "name".to_string(),
                    inferred_type: MetadataColumnType::String,
                },
                FieldSpec {
                    name: "message_offset".to_string(),
                    inferred_type: MetadataColumnType::Integer,
                },
            ]
        );
    }
}

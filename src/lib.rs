//! # Sinkbridge Core
//!
//! Core library for building batch sink connectors.
//!
//! This library converts ordered batches of opaque, binary-encoded messages
//! (consumed from a log/queue system) into typed records for heterogeneous
//! storage backends - a columnar warehouse, a wide-column store, a key/value
//! cache, an HTTP endpoint - while preserving per-message success/failure
//! outcomes so that only failing messages are retried or dead-lettered.
//!
//! ## Overview
//!
//! The pipeline has two halves:
//! - **Parsing**: schema-driven decoding of wire-format or JSON payloads
//!   into a typed, path-addressable view ([`parser::ParsedMessage`])
//! - **Batch conversion**: applying a sink-specific record builder to every
//!   message independently, classifying each failure into a fixed taxonomy,
//!   and returning position-preserving valid/invalid collections
//!   ([`Records`])
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sinkbridge_core::builders::TableRecordBuilder;
//! use sinkbridge_core::config::ConverterConfig;
//! use sinkbridge_core::convert::BatchConverter;
//! use sinkbridge_core::parser::MessageParser;
//! use sinkbridge_core::schema::{FieldDecl, InMemoryRegistry, SchemaDescriptor, TypeName};
//! use sinkbridge_core::Message;
//! use std::sync::Arc;
//!
//! let mut registry = InMemoryRegistry::new();
//! registry.register(SchemaDescriptor::new(
//!     "Order",
//!     vec![
//!         FieldDecl::new("order_id", 1, TypeName::String),
//!         FieldDecl::new("amount", 2, TypeName::Long),
//!     ],
//! ));
//!
//! let config = ConverterConfig {
//!     schema_name: Some("Order".to_string()),
//!     ..ConverterConfig::default()
//! };
//! let parser = MessageParser::new(Arc::new(registry), &config);
//! let converter = BatchConverter::new(parser, TableRecordBuilder::new(), config).unwrap();
//!
//! let batch = vec![Message::with_value(&b"\x0a\x03abc\x10\x2a"[..])];
//! let records = converter.convert(&batch);
//! assert_eq!(records.len(), batch.len());
//! ```
//!
//! ## Features
//!
//! - **Schema-driven decoding**: explicit schema models compiled from an
//!   external registry, no runtime reflection
//! - **Partial-failure semantics**: one record per input message, valid or
//!   invalid, with the original batch index as the stable join key
//! - **Uniform error taxonomy**: client-side and backend-reported failures
//!   classified into one fixed [`ErrorKind`] set
//! - **Sink adapters**: async trait boundary for backend clients, with
//!   per-index error feedback merged back into the batch result

pub mod builders;
pub mod config;
pub mod convert;
pub mod error;
mod message;
pub mod metrics;
pub mod parser;
pub mod schema;
pub mod sink;
mod value;

// Re-export public API
pub use convert::{BatchConverter, FieldSpec, RecordBuilder};
pub use error::{ConvertError, ConvertResult, ErrorDescriptor, ErrorKind};
pub use message::{metadata_keys, Message, Record, Records};
pub use metrics::ConverterMetrics;
pub use parser::{MessageParser, ParsedMessage};
pub use sink::{SinkAdapter, SinkResponse};
pub use value::{ScalarKind, Value};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

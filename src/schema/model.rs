//! Immutable in-memory schema model.
//!
//! A [`SchemaModel`] is built once per schema name when it is first resolved
//! against the registry and never mutated afterwards. Field lookup is plain
//! map indexing; nested message references form a DAG rooted at the
//! top-level schema (recursive types are out of scope).

use crate::value::ScalarKind;
use crate::{ConvertError, ConvertResult, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// One enum symbol: wire number and symbolic name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumSymbol {
    pub number: i32,
    pub name: String,
}

/// Declared type of a field
#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Bytes,
    /// Enum with its symbol table; values convert to symbolic names
    Enum(Vec<EnumSymbol>),
    /// Nested message described by its own model
    Message(Arc<SchemaModel>),
    /// Map, modeled as a repeated synthetic entry message with `key` at
    /// tag 1 and `value` at tag 2 (the wire representation)
    Map(Arc<SchemaModel>),
    /// Well-known timestamp (seconds + nanos)
    Timestamp,
    /// Well-known duration (seconds + nanos)
    Duration,
    /// Well-known free-form struct, converted to canonical JSON
    Struct,
}

impl FieldKind {
    /// The scalar family this kind belongs to, if it carries a wire default
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            FieldKind::String => Some(ScalarKind::String),
            FieldKind::Integer | FieldKind::Long => Some(ScalarKind::Integer),
            FieldKind::Float | FieldKind::Double => Some(ScalarKind::Float),
            FieldKind::Boolean => Some(ScalarKind::Bool),
            FieldKind::Bytes => Some(ScalarKind::Bytes),
            _ => None,
        }
    }

    /// The default value an unset, non-repeated field resolves to
    ///
    /// Scalars get their zero value, enums the symbol for number 0.
    /// Well-known types, messages, and maps have no default (`None`).
    pub fn default_value(&self) -> Option<Value> {
        match self {
            FieldKind::Enum(symbols) => symbols
                .iter()
                .find(|s| s.number == 0)
                .map(|s| Value::String(s.name.clone())),
            _ => self.scalar_kind().map(Value::zero_of),
        }
    }

    /// Nested model for message and map kinds
    pub fn nested(&self) -> Option<&Arc<SchemaModel>> {
        match self {
            FieldKind::Message(m) | FieldKind::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Human-readable kind name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Long => "long",
            FieldKind::Float => "float",
            FieldKind::Double => "double",
            FieldKind::Boolean => "boolean",
            FieldKind::Bytes => "bytes",
            FieldKind::Enum(_) => "enum",
            FieldKind::Message(_) => "message",
            FieldKind::Map(_) => "map",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Duration => "duration",
            FieldKind::Struct => "struct",
        }
    }
}

/// Descriptor for one field of a message type
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Field name, unique within its schema
    pub name: String,
    /// Wire tag number
    pub number: u32,
    /// Declared type
    pub kind: FieldKind,
    /// Whether the field is repeated (maps are always repeated on the wire)
    pub repeated: bool,
}

impl FieldDescriptor {
    /// Create a singular field
    pub fn new(name: impl Into<String>, number: u32, kind: FieldKind) -> Self {
        let repeated = matches!(kind, FieldKind::Map(_));
        Self {
            name: name.into(),
            number,
            kind,
            repeated,
        }
    }

    /// Mark the field as repeated
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }
}

/// Immutable field catalog for one named message type
///
/// **Mandatory public API** - parsing and path resolution walk this model
/// instead of doing runtime reflection.
#[derive(Debug)]
pub struct SchemaModel {
    name: String,
    fields: Vec<FieldDescriptor>,
    by_name: HashMap<String, usize>,
    by_number: HashMap<u32, usize>,
}

impl SchemaModel {
    /// Build a model, validating field name and tag uniqueness
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> ConvertResult<Self> {
        let name = name.into();
        let mut by_name = HashMap::with_capacity(fields.len());
        let mut by_number = HashMap::with_capacity(fields.len());

        for (idx, field) in fields.iter().enumerate() {
            if by_name.insert(field.name.clone(), idx).is_some() {
                return Err(ConvertError::InvalidSchema {
                    schema: name,
                    reason: format!("duplicate field name '{}'", field.name),
                });
            }
            if by_number.insert(field.number, idx).is_some() {
                return Err(ConvertError::InvalidSchema {
                    schema: name,
                    reason: format!("duplicate field number {}", field.number),
                });
            }
        }

        Ok(Self {
            name,
            fields,
            by_name,
            by_number,
        })
    }

    /// The synthetic entry model backing a map field
    pub(crate) fn map_entry(key: FieldKind, value: FieldKind) -> ConvertResult<Arc<Self>> {
        Ok(Arc::new(Self::new(
            "$map_entry",
            vec![
                FieldDescriptor::new("key", 1, key),
                FieldDescriptor::new("value", 2, value),
            ],
        )?))
    }

    /// Schema name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&idx| &self.fields[idx])
    }

    /// Look up a field by wire tag number
    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.by_number.get(&number).map(|&idx| &self.fields[idx])
    }

    /// Look up a field's declaration position by wire tag number
    pub fn position_by_number(&self, number: u32) -> Option<usize> {
        self.by_number.get(&number).copied()
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema declares no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

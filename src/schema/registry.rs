//! Schema registry boundary and model cache.
//!
//! The registry itself is an external collaborator; the core only consumes
//! [`SchemaRegistry::descriptor`] and compiles the returned description into
//! an immutable [`SchemaModel`], cached for the process lifetime. Callers
//! that need to pick up a registry update re-resolve under a fresh cache.

use super::model::{EnumSymbol, FieldDescriptor, FieldKind, SchemaModel};
use crate::{ConvertError, ConvertResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

/// Declared type name in a schema descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    String,
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Bytes,
    Enum,
    Message,
    Map,
    Timestamp,
    Duration,
    Struct,
}

/// One field declaration inside a [`SchemaDescriptor`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// Wire tag number
    pub number: u32,
    /// Declared type
    #[serde(rename = "type")]
    pub type_name: TypeName,
    /// Repeated field
    #[serde(default)]
    pub repeated: bool,
    /// Nested schema name, for `message`-typed fields and `map` values
    /// of message type
    #[serde(default)]
    pub message: Option<String>,
    /// Symbol table, for `enum`-typed fields
    #[serde(default)]
    pub symbols: Vec<EnumSymbol>,
    /// Map key type, for `map`-typed fields
    #[serde(default)]
    pub key: Option<TypeName>,
    /// Map value type, for `map`-typed fields
    #[serde(default)]
    pub value: Option<TypeName>,
}

impl FieldDecl {
    /// Declare a scalar or well-known field
    pub fn new(name: impl Into<String>, number: u32, type_name: TypeName) -> Self {
        Self {
            name: name.into(),
            number,
            type_name,
            repeated: false,
            message: None,
            symbols: Vec::new(),
            key: None,
            value: None,
        }
    }

    /// Declare a nested message field
    pub fn message(name: impl Into<String>, number: u32, schema: impl Into<String>) -> Self {
        Self {
            message: Some(schema.into()),
            ..Self::new(name, number, TypeName::Message)
        }
    }

    /// Declare an enum field with its symbol table
    pub fn enumeration(name: impl Into<String>, number: u32, symbols: Vec<EnumSymbol>) -> Self {
        Self {
            symbols,
            ..Self::new(name, number, TypeName::Enum)
        }
    }

    /// Declare a map field with scalar key/value types
    pub fn map(name: impl Into<String>, number: u32, key: TypeName, value: TypeName) -> Self {
        Self {
            key: Some(key),
            value: Some(value),
            ..Self::new(name, number, TypeName::Map)
        }
    }

    /// Mark the field as repeated
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }
}

/// Structural description of one message type, as returned by the registry
///
/// Serde-friendly so registries can ship descriptors as JSON or TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Schema name
    pub name: String,
    /// Field declarations in order
    pub fields: Vec<FieldDecl>,
}

impl SchemaDescriptor {
    /// Create a descriptor
    pub fn new(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// External descriptor registry boundary
///
/// Implementations may call out over the network; the core only ever calls
/// this on a cache miss.
pub trait SchemaRegistry: Send + Sync {
    /// Look up the descriptor for a schema name, `None` when unregistered
    fn descriptor(&self, schema_name: &str) -> Option<SchemaDescriptor>;
}

/// Simple in-process registry, used in tests and for statically configured
/// deployments
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    descriptors: HashMap<String, SchemaDescriptor>,
}

impl InMemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its own name
    pub fn register(&mut self, descriptor: SchemaDescriptor) {
        self.descriptors.insert(descriptor.name.clone(), descriptor);
    }
}

impl SchemaRegistry for InMemoryRegistry {
    fn descriptor(&self, schema_name: &str) -> Option<SchemaDescriptor> {
        self.descriptors.get(schema_name).cloned()
    }
}

/// Process-lifetime cache of compiled schema models
///
/// Write-once-per-key: concurrent misses may compile the same name twice,
/// which is harmless since both compilations yield an equivalent model and
/// the first insert wins.
#[derive(Default)]
pub struct SchemaCache {
    models: RwLock<HashMap<String, Arc<SchemaModel>>>,
}

impl SchemaCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a schema name to its compiled model, building and caching it
    /// on first use
    pub fn resolve(
        &self,
        schema_name: &str,
        registry: &dyn SchemaRegistry,
    ) -> ConvertResult<Arc<SchemaModel>> {
        let mut stack = Vec::new();
        self.resolve_inner(schema_name, registry, &mut stack)
    }

    fn resolve_inner(
        &self,
        schema_name: &str,
        registry: &dyn SchemaRegistry,
        stack: &mut Vec<String>,
    ) -> ConvertResult<Arc<SchemaModel>> {
        // Fast path: read lock only
        {
            let models = self.models.read().expect("schema cache poisoned");
            if let Some(model) = models.get(schema_name) {
                trace!("schema cache hit for '{}'", schema_name);
                return Ok(model.clone());
            }
        }

        if stack.iter().any(|s| s == schema_name) {
            return Err(ConvertError::InvalidSchema {
                schema: schema_name.to_string(),
                reason: format!("recursive schema reference via {}", stack.join(" -> ")),
            });
        }

        debug!("schema cache miss for '{}', compiling", schema_name);
        let descriptor = registry
            .descriptor(schema_name)
            .ok_or_else(|| ConvertError::SchemaNotFound(schema_name.to_string()))?;

        stack.push(schema_name.to_string());
        let model = self.compile(&descriptor, registry, stack)?;
        stack.pop();

        let mut models = self.models.write().expect("schema cache poisoned");
        let entry = models
            .entry(schema_name.to_string())
            .or_insert_with(|| Arc::new(model));
        Ok(entry.clone())
    }

    fn compile(
        &self,
        descriptor: &SchemaDescriptor,
        registry: &dyn SchemaRegistry,
        stack: &mut Vec<String>,
    ) -> ConvertResult<SchemaModel> {
        let mut fields = Vec::with_capacity(descriptor.fields.len());
        for decl in &descriptor.fields {
            let kind = self.compile_kind(&descriptor.name, decl, registry, stack)?;
            let mut field = FieldDescriptor::new(decl.name.clone(), decl.number, kind);
            if decl.repeated {
                field = field.repeated();
            }
            fields.push(field);
        }
        SchemaModel::new(descriptor.name.clone(), fields)
    }

    fn compile_kind(
        &self,
        schema: &str,
        decl: &FieldDecl,
        registry: &dyn SchemaRegistry,
        stack: &mut Vec<String>,
    ) -> ConvertResult<FieldKind> {
        let invalid = |reason: String| ConvertError::InvalidSchema {
            schema: schema.to_string(),
            reason,
        };

        Ok(match decl.type_name {
            TypeName::String => FieldKind::String,
            TypeName::Integer => FieldKind::Integer,
            TypeName::Long => FieldKind::Long,
            TypeName::Float => FieldKind::Float,
            TypeName::Double => FieldKind::Double,
            TypeName::Boolean => FieldKind::Boolean,
            TypeName::Bytes => FieldKind::Bytes,
            TypeName::Timestamp => FieldKind::Timestamp,
            TypeName::Duration => FieldKind::Duration,
            TypeName::Struct => FieldKind::Struct,
            TypeName::Enum => {
                if decl.symbols.is_empty() {
                    return Err(invalid(format!(
                        "enum field '{}' declares no symbols",
                        decl.name
                    )));
                }
                FieldKind::Enum(decl.symbols.clone())
            }
            TypeName::Message => {
                let nested = decl.message.as_deref().ok_or_else(|| {
                    invalid(format!(
                        "message field '{}' missing nested schema name",
                        decl.name
                    ))
                })?;
                FieldKind::Message(self.resolve_inner(nested, registry, stack)?)
            }
            TypeName::Map => {
                let key = decl.key.ok_or_else(|| {
                    invalid(format!("map field '{}' missing key type", decl.name))
                })?;
                let value = decl.value.ok_or_else(|| {
                    invalid(format!("map field '{}' missing value type", decl.name))
                })?;
                let key_kind = match key {
                    TypeName::String => FieldKind::String,
                    TypeName::Integer => FieldKind::Integer,
                    TypeName::Long => FieldKind::Long,
                    TypeName::Boolean => FieldKind::Boolean,
                    other => {
                        return Err(invalid(format!(
                            "map field '{}' has non-scalar key type {:?}",
                            decl.name, other
                        )))
                    }
                };
                let value_kind = match value {
                    TypeName::Message => {
                        let nested = decl.message.as_deref().ok_or_else(|| {
                            invalid(format!(
                                "map field '{}' missing value schema name",
                                decl.name
                            ))
                        })?;
                        FieldKind::Message(self.resolve_inner(nested, registry, stack)?)
                    }
                    TypeName::Map => {
                        return Err(invalid(format!(
                            "map field '{}' cannot have a map value",
                            decl.name
                        )))
                    }
                    scalar => self.compile_kind(
                        schema,
                        &FieldDecl {
                            symbols: decl.symbols.clone(),
                            ..FieldDecl::new(decl.name.clone(), decl.number, scalar)
                        },
                        registry,
                        stack,
                    )?,
                };
                FieldKind::Map(SchemaModel::map_entry(key_kind, value_kind)?)
            }
        })
    }

    /// Number of cached models (for monitoring)
    pub fn len(&self) -> usize {
        self.models.read().expect("schema cache poisoned").len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

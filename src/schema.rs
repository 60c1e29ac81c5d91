//! Schema model and registry boundary.
//!
//! This module provides the immutable in-memory representation of a message
//! type ([`SchemaModel`]) and the boundary to the external descriptor
//! registry ([`SchemaRegistry`]), including the process-lifetime model cache.

mod model;
mod registry;

pub use model::{EnumSymbol, FieldDescriptor, FieldKind, SchemaModel};
pub use registry::{
    FieldDecl, InMemoryRegistry, SchemaCache, SchemaDescriptor, SchemaRegistry, TypeName,
};

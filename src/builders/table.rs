//! Columnar-warehouse record builder.

use crate::convert::RecordBuilder;
use crate::parser::ParsedMessage;
use crate::{ConvertResult, Message, Value};

/// Builds one table row per message: the full flattened field mapping
///
/// Warehouse destinations take every schema field as a column, so this
/// builder has no per-field configuration; metadata columns and the
/// injected timestamp are merged in by the batch converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableRecordBuilder;

impl TableRecordBuilder {
    /// Create a table record builder
    pub fn new() -> Self {
        Self
    }
}

impl RecordBuilder for TableRecordBuilder {
    fn build(
        &self,
        parsed: &ParsedMessage,
        _message: &Message,
    ) -> ConvertResult<Vec<(String, Value)>> {
        Ok(parsed.flatten().to_vec())
    }
}

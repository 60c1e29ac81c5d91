//! Wide-column record builder: row key template plus cell mappings.

use crate::builders::template::Template;
use crate::convert::RecordBuilder;
use crate::parser::ParsedMessage;
use crate::{ConvertResult, Message, Value};

/// Output field carrying the rendered row key
pub const ROW_KEY_FIELD: &str = "row_key";

/// Maps one schema field path onto a wide-column cell
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    /// Column family name
    pub family: String,
    /// Column qualifier within the family
    pub qualifier: String,
    /// Field path supplying the cell value
    pub field_path: String,
}

impl ColumnMapping {
    /// Create a cell mapping
    pub fn new(
        family: impl Into<String>,
        qualifier: impl Into<String>,
        field_path: impl Into<String>,
    ) -> Self {
        Self {
            family: family.into(),
            qualifier: qualifier.into(),
            field_path: field_path.into(),
        }
    }

    fn output_name(&self) -> String {
        format!("{}:{}", self.family, self.qualifier)
    }
}

/// Builds wide-column mutations: a templated row key and one cell per
/// configured column mapping
///
/// Template syntax errors are caught at construction; a template or
/// mapping that references a field the schema does not have fails each
/// record at build time with an unknown-field classification.
#[derive(Debug, Clone)]
pub struct CellRecordBuilder {
    row_key: Template,
    columns: Vec<ColumnMapping>,
}

impl CellRecordBuilder {
    /// Create a builder from a row-key template and cell mappings
    pub fn new(row_key_template: &str, columns: Vec<ColumnMapping>) -> ConvertResult<Self> {
        Ok(Self {
            row_key: Template::parse(row_key_template)?,
            columns,
        })
    }
}

impl RecordBuilder for CellRecordBuilder {
    fn build(
        &self,
        parsed: &ParsedMessage,
        _message: &Message,
    ) -> ConvertResult<Vec<(String, Value)>> {
        let mut fields = Vec::with_capacity(self.columns.len() + 1);
        fields.push((
            ROW_KEY_FIELD.to_string(),
            Value::String(self.row_key.render(parsed)?),
        ));

        for column in &self.columns {
            let value = parsed
                .get(&column.field_path)?
                .unwrap_or_else(|| Value::String(String::new()));
            fields.push((column.output_name(), value));
        }
        Ok(fields)
    }
}

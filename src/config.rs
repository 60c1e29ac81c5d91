//! Configuration for batch conversion.
//!
//! The configuration is an explicit struct passed into the parser and
//! converter constructors at startup; there is no process-wide mutable
//! configuration state.

use crate::{ConvertError, ConvertResult};
use serde::{Deserialize, Serialize};

/// Which half of the message carries the schema-typed payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParseMode {
    /// Parse the key bytes
    Key,
    /// Parse the value bytes
    #[default]
    Value,
}

impl std::fmt::Display for ParseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseMode::Key => write!(f, "KEY"),
            ParseMode::Value => write!(f, "VALUE"),
        }
    }
}

/// Payload encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Schema-driven binary wire format
    #[default]
    Proto,
    /// Schemaless flat JSON objects
    Json,
}

/// Target conversion type for a projected metadata column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataColumnType {
    #[default]
    String,
    Integer,
    /// Epoch-milliseconds metadata rendered as an instant
    Timestamp,
}

/// One transport-metadata key projected into the output fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataColumn {
    /// Metadata key, also used as the output field name
    pub name: String,
    /// Conversion applied to the metadata string value
    #[serde(rename = "type", default)]
    pub column_type: MetadataColumnType,
}

/// Metadata projection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataSettings {
    /// If non-empty, metadata-derived fields are nested under this single
    /// output field instead of being flattened alongside payload fields
    #[serde(default)]
    pub namespace: String,

    /// Which metadata keys to project and their target types
    #[serde(default)]
    pub columns: Vec<MetadataColumn>,
}

/// Wall-clock injection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTimestampSettings {
    /// Add a receive-time field to successful records only
    #[serde(default)]
    pub inject: bool,

    /// Output field name for the injected instant
    #[serde(default = "default_event_timestamp_field")]
    pub field: String,
}

fn default_event_timestamp_field() -> String {
    "event_received_at".to_string()
}

impl Default for EventTimestampSettings {
    fn default() -> Self {
        Self {
            inject: false,
            field: default_event_timestamp_field(),
        }
    }
}

/// Main configuration for the parser and batch converter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Batch-global schema name (mandatory for proto input)
    #[serde(default)]
    pub schema_name: Option<String>,

    /// Which message half carries the payload
    #[serde(default)]
    pub parse_mode: ParseMode,

    /// Payload encoding
    #[serde(default)]
    pub input_format: InputFormat,

    /// Tolerate wire fields not declared in the schema
    #[serde(default = "default_allow_unknown_fields")]
    pub allow_unknown_fields: bool,

    /// Accept nested objects/arrays in JSON mode
    #[serde(default)]
    pub allow_nested_json: bool,

    /// Metadata projection
    #[serde(default)]
    pub metadata: MetadataSettings,

    /// Wall-clock injection
    #[serde(default)]
    pub event_timestamp: EventTimestampSettings,
}

fn default_allow_unknown_fields() -> bool {
    true
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            schema_name: None,
            parse_mode: ParseMode::Value,
            input_format: InputFormat::Proto,
            allow_unknown_fields: true,
            allow_nested_json: false,
            metadata: MetadataSettings::default(),
            event_timestamp: EventTimestampSettings::default(),
        }
    }
}

impl ConverterConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> ConvertResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConvertError::config(format!("Failed to read config file {}: {}", path, e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            ConvertError::config(format!("Failed to parse config file {}: {}", path, e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConvertResult<()> {
        if self.input_format == InputFormat::Proto
            && self.schema_name.as_deref().unwrap_or("").is_empty()
        {
            return Err(ConvertError::config(
                "schema_name is required for proto input",
            ));
        }

        for column in &self.metadata.columns {
            if column.name.is_empty() {
                return Err(ConvertError::config("metadata column name cannot be empty"));
            }
        }

        if self.event_timestamp.inject && self.event_timestamp.field.is_empty() {
            return Err(ConvertError::config(
                "event_timestamp.field cannot be empty when injection is enabled",
            ));
        }

        Ok(())
    }

    /// The schema name to parse with, after validation
    pub(crate) fn schema_name(&self) -> &str {
        self.schema_name.as_deref().unwrap_or("json")
    }
}

//! Error taxonomy for batch conversion.
//!
//! Every failure — client-side parsing/building and backend-reported
//! post-write errors — is classified into the same fixed [`ErrorKind`] set,
//! so downstream consumers (metrics, dead-letter routing) work with one
//! failure vocabulary regardless of where the failure originated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for conversion operations
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Fixed classification of conversion failures
///
/// **Mandatory public API** - attached to every invalid record and used as
/// the metrics error label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Both key and value were absent/empty for the configured parse mode
    InvalidMessage,
    /// Bytes were present but did not decode as the named schema
    Deserialization,
    /// Decode succeeded but strict field checking rejected the payload, or
    /// a configured field path/template referenced a nonexistent field
    UnknownFields,
    /// Any other unclassified failure during record building
    Default,
    /// Backend rejected the record with a 4xx-class status
    Sink4xx,
    /// Backend rejected the record with a 5xx-class status
    Sink5xx,
    /// Backend reported a transient failure worth retrying
    SinkRetryable,
    /// Backend failure with no status code and no retryability signal
    SinkUnknown,
}

impl ErrorKind {
    /// Check whether this kind was reported by the backend after a write,
    /// as opposed to raised locally during parsing/building
    pub fn is_sink_side(&self) -> bool {
        matches!(
            self,
            ErrorKind::Sink4xx
                | ErrorKind::Sink5xx
                | ErrorKind::SinkRetryable
                | ErrorKind::SinkUnknown
        )
    }

    /// Stable label for metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidMessage => "INVALID_MESSAGE_ERROR",
            ErrorKind::Deserialization => "DESERIALIZATION_ERROR",
            ErrorKind::UnknownFields => "UNKNOWN_FIELDS_ERROR",
            ErrorKind::Default => "DEFAULT_ERROR",
            ErrorKind::Sink4xx => "SINK_4XX_ERROR",
            ErrorKind::Sink5xx => "SINK_5XX_ERROR",
            ErrorKind::SinkRetryable => "SINK_RETRYABLE_ERROR",
            ErrorKind::SinkUnknown => "SINK_UNKNOWN_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error kind plus its underlying cause
///
/// Attached to invalid records; never present on valid records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    /// Classified failure kind
    pub kind: ErrorKind,
    /// Human-readable cause, preserved for dead-letter payloads
    pub cause: String,
}

impl ErrorDescriptor {
    /// Create a new descriptor
    pub fn new(kind: ErrorKind, cause: impl Into<String>) -> Self {
        Self {
            kind,
            cause: cause.into(),
        }
    }
}

impl std::fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.cause)
    }
}

/// Error type for parsing and record building
///
/// **Mandatory public API** - parsing, path resolution, and record builders
/// all return this. The batch converter maps it onto [`ErrorKind`] via
/// [`ConvertError::kind`] instead of relying on an error-type hierarchy.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Selected payload half (key or value) is absent or zero-length
    #[error("Empty message: {0}")]
    EmptyMessage(String),

    /// Payload shape is not supported by the configured parsing mode
    /// (e.g. nested JSON under the flat-JSON policy)
    #[error("Unsupported message: {0}")]
    Unsupported(String),

    /// Payload bytes do not decode under the named schema or format
    #[error("Decoding error: {message}")]
    Decoding {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Strict field checking rejected wire fields absent from the schema
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A field path does not resolve against the schema
    #[error("Invalid field path '{path}': {reason}")]
    InvalidFieldPath { path: String, reason: String },

    /// Schema name is not registered
    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    /// Schema descriptor could not be compiled into a model
    #[error("Invalid schema '{schema}': {reason}")]
    InvalidSchema { schema: String, reason: String },

    /// A value has no canonical JSON representation (NaN/Infinity)
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Malformed user-supplied template or any other building failure
    #[error("Record building error: {0}")]
    Build(String),

    /// Configuration error, detected at startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O error (config file loading)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Classify this error into the fixed taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::EmptyMessage(_) | ConvertError::Unsupported(_) => {
                ErrorKind::InvalidMessage
            }
            ConvertError::Decoding { .. } => ErrorKind::Deserialization,
            ConvertError::UnknownField(_)
            | ConvertError::InvalidFieldPath { .. }
            | ConvertError::SchemaNotFound(_) => ErrorKind::UnknownFields,
            _ => ErrorKind::Default,
        }
    }

    /// Build the descriptor attached to an invalid record
    pub fn descriptor(&self) -> ErrorDescriptor {
        ErrorDescriptor::new(self.kind(), self.to_string())
    }

    /// Create a decoding error from a message
    pub fn decoding(message: impl Into<String>) -> Self {
        ConvertError::Decoding {
            message: message.into(),
            source: None,
        }
    }

    /// Create a decoding error with source
    pub fn decoding_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConvertError::Decoding {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid field path error
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ConvertError::InvalidFieldPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        ConvertError::Configuration(message.into())
    }
}

/// One backend-reported error detail for a single record
///
/// Produced by sink adapters after the network write; the core classifies
/// it via [`classify_sink_error`] when merging failures back by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkErrorDetail {
    /// HTTP-status-like code from the backend, if it reports one
    pub code: Option<u16>,
    /// Explicit retryability flag from the backend client
    pub retryable: bool,
    /// Backend error message
    pub message: String,
}

impl SinkErrorDetail {
    /// Create a detail carrying a status code
    pub fn with_code(code: u16, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            retryable: false,
            message: message.into(),
        }
    }

    /// Create a retryable detail
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            code: None,
            retryable: true,
            message: message.into(),
        }
    }
}

/// Classify a backend-reported error into the sink-side taxonomy
///
/// The backend client supplies an HTTP-status-like code and/or an explicit
/// retryability flag; the core applies no judgement of its own.
pub fn classify_sink_error(code: Option<u16>, retryable: bool) -> ErrorKind {
    if retryable {
        return ErrorKind::SinkRetryable;
    }
    match code {
        Some(c) if (400..500).contains(&c) => ErrorKind::Sink4xx,
        Some(c) if (500..600).contains(&c) => ErrorKind::Sink5xx,
        _ => ErrorKind::SinkUnknown,
    }
}

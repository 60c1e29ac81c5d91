//! Incoming message type - the unit of input for batch conversion.

use bytes::Bytes;
use std::collections::HashMap;

/// Well-known transport metadata keys
///
/// The metadata map is open-ended; these are the keys the log/queue client
/// is expected to populate and that metadata column projection understands.
pub mod metadata_keys {
    /// Source topic name
    pub const TOPIC: &str = "message_topic";
    /// Source partition
    pub const PARTITION: &str = "message_partition";
    /// Offset within the partition
    pub const OFFSET: &str = "message_offset";
    /// Broker publish time, epoch milliseconds
    pub const PUBLISH_TIME: &str = "message_timestamp";
    /// Connector ingestion time, epoch milliseconds
    pub const INGESTION_TIME: &str = "load_time";
}

/// One consumed message: key/value byte halves plus transport metadata
///
/// Either half may be absent; which one carries the schema-typed payload is
/// selected by the configured parse mode. At least the selected half must be
/// present and non-empty, or parsing fails with an empty-message error
/// distinct from malformed bytes.
#[derive(Debug, Clone, Default)]
pub struct Message {
    /// Key bytes, if any
    pub key: Option<Bytes>,
    /// Value bytes, if any
    pub value: Option<Bytes>,
    /// Open-ended transport metadata (topic, partition, offset, timestamps,
    /// and arbitrary sink-defined keys)
    pub metadata: HashMap<String, String>,
}

impl Message {
    /// Create a message with a value payload only
    pub fn with_value(value: impl Into<Bytes>) -> Self {
        Self {
            key: None,
            value: Some(value.into()),
            metadata: HashMap::new(),
        }
    }

    /// Create a message with a key payload only
    pub fn with_key(key: impl Into<Bytes>) -> Self {
        Self {
            key: Some(key.into()),
            value: None,
            metadata: HashMap::new(),
        }
    }

    /// Create a message with both halves
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Get a metadata value
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }

    /// Source topic, if the transport provided it
    pub fn topic(&self) -> Option<&str> {
        self.metadata_value(metadata_keys::TOPIC)
    }

    /// Source partition, if the transport provided it
    pub fn partition(&self) -> Option<&str> {
        self.metadata_value(metadata_keys::PARTITION)
    }

    /// Offset within the partition, if the transport provided it
    pub fn offset(&self) -> Option<&str> {
        self.metadata_value(metadata_keys::OFFSET)
    }
}

//! Sink-specific record builders.
//!
//! One builder per backend family, all implementing
//! [`crate::convert::RecordBuilder`]. Builders shape output field mappings
//! only; network I/O lives behind [`crate::sink::SinkAdapter`].

mod cell;
mod http;
mod kv;
mod table;
mod template;

pub use cell::{CellRecordBuilder, ColumnMapping, ROW_KEY_FIELD};
pub use http::{HttpRecordBuilder, BODY_FIELD};
pub use kv::{KvRecordBuilder, KEY_FIELD, VALUE_FIELD};
pub use table::TableRecordBuilder;

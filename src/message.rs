//! Input messages and output records.

mod incoming;
mod record;

pub use incoming::{metadata_keys, Message};
pub use record::{Record, Records};

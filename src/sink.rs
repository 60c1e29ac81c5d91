//! Sink adapter trait - the seam between conversion and backend clients.

use crate::convert::FieldSpec;
use crate::error::SinkErrorDetail;
use crate::{ConvertResult, Record};
use async_trait::async_trait;
use std::collections::HashMap;

/// Outcome of one backend write attempt
///
/// Failures are keyed by the batch index of the affected record, so the
/// caller can merge them back into a [`crate::Records`] result via
/// [`crate::Records::apply_sink_errors`]. An empty map means every record
/// was accepted.
#[derive(Debug, Clone, Default)]
pub struct SinkResponse {
    /// Per-record failures, keyed by batch index
    pub errors: HashMap<usize, Vec<SinkErrorDetail>>,
}

impl SinkResponse {
    /// Response with no failures
    pub fn ok() -> Self {
        Self::default()
    }

    /// Whether every record was accepted
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Attach a failure detail for one record
    pub fn push_error(&mut self, index: usize, detail: SinkErrorDetail) {
        self.errors.entry(index).or_default().push(detail);
    }
}

/// Trait for implementing sink adapters (records → external system)
///
/// One implementation per backend. The adapter receives only valid records
/// and reports per-record failures by batch index; it never panics the
/// batch on a single bad record.
///
/// # Example
///
/// ```rust,no_run
/// use sinkbridge_core::{Record, SinkAdapter, SinkResponse};
/// use sinkbridge_core::error::SinkErrorDetail;
/// use sinkbridge_core::ConvertResult;
/// use async_trait::async_trait;
///
/// pub struct LoggingSink;
///
/// #[async_trait]
/// impl SinkAdapter for LoggingSink {
///     async fn write(&mut self, records: &[Record]) -> ConvertResult<SinkResponse> {
///         for record in records {
///             println!("{}: {} fields", record.index, record.fields.len());
///         }
///         Ok(SinkResponse::ok())
///     }
/// }
/// ```
#[async_trait]
pub trait SinkAdapter: Send + Sync {
    /// Write a batch of valid records to the backend
    ///
    /// Returns `Ok` with per-record failures in the response when the write
    /// itself went through; returns `Err` only when the whole attempt
    /// failed before any record outcome was known (connection refused,
    /// serialization of the request itself).
    async fn write(&mut self, records: &[Record]) -> ConvertResult<SinkResponse>;

    /// Optional: request destination-schema additions
    ///
    /// Called by schema-flexible callers after the backend rejects records
    /// for missing fields, with specs built by
    /// [`crate::convert::schema_evolution_request`]. Backends without
    /// schema evolution keep the default no-op.
    async fn evolve_schema(&mut self, specs: &[FieldSpec]) -> ConvertResult<()> {
        let _ = specs;
        Ok(())
    }

    /// Optional: verify connectivity to the backend
    async fn health_check(&self) -> ConvertResult<()> {
        Ok(())
    }

    /// Optional: flush pending writes and release resources
    async fn shutdown(&mut self) -> ConvertResult<()> {
        Ok(())
    }
}

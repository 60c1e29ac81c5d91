//! Output records and the valid/invalid batch result.

use crate::error::{classify_sink_error, ErrorDescriptor, SinkErrorDetail};
use crate::Value;
use std::collections::HashMap;
use tracing::warn;

/// One output unit for one input message
///
/// Exactly one of the output field mapping or the error descriptor is the
/// primary content, but transport metadata is always present so that failed
/// records remain identifiable downstream (dead-lettering needs
/// topic/partition/offset).
#[derive(Debug, Clone)]
pub struct Record {
    /// Transport metadata copied from the input message
    pub metadata: HashMap<String, String>,
    /// Output field mapping, in build order; empty on invalid records
    pub fields: Vec<(String, Value)>,
    /// 0-based position in the input batch, stable across partitioning and
    /// the join key for backend error merge
    pub index: usize,
    /// Classified failure, present on invalid records only
    pub error: Option<ErrorDescriptor>,
}

impl Record {
    /// Create a valid record
    pub fn valid(
        index: usize,
        metadata: HashMap<String, String>,
        fields: Vec<(String, Value)>,
    ) -> Self {
        Self {
            metadata,
            fields,
            index,
            error: None,
        }
    }

    /// Create an invalid record with an empty output mapping
    pub fn invalid(index: usize, metadata: HashMap<String, String>, error: ErrorDescriptor) -> Self {
        Self {
            metadata,
            fields: Vec::new(),
            index,
            error: Some(error),
        }
    }

    /// Whether this record converted successfully
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Look up an output field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Position-preserving batch conversion result
///
/// **Mandatory public API** - every batch yields exactly one `Records` with
/// one record per input message; callers acknowledge `valid` and react to
/// `invalid` (log, dead-letter, retry a narrowed batch of failed indices).
#[derive(Debug, Clone, Default)]
pub struct Records {
    /// Successfully converted records
    pub valid: Vec<Record>,
    /// Records that failed parsing/building or were rejected by the backend
    pub invalid: Vec<Record>,
}

impl Records {
    /// Total record count across both collections
    pub fn len(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }

    /// Whether no records were produced
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty() && self.invalid.is_empty()
    }

    /// All records merged back into original batch order
    pub fn into_ordered(self) -> Vec<Record> {
        let mut all: Vec<Record> = self.valid.into_iter().chain(self.invalid).collect();
        all.sort_by_key(|r| r.index);
        all
    }

    /// Batch indices of the invalid records
    pub fn invalid_indices(&self) -> Vec<usize> {
        self.invalid.iter().map(|r| r.index).collect()
    }

    /// Merge backend-reported per-record errors back into this result
    ///
    /// The sink adapter reports failures keyed by batch index after the
    /// network write; the affected previously-valid records move to
    /// `invalid` carrying the classified sink-side error. Indices that do
    /// not name a valid record are ignored with a warning (the backend may
    /// echo indices the core already failed locally).
    pub fn apply_sink_errors(&mut self, errors: HashMap<usize, Vec<SinkErrorDetail>>) {
        for (index, details) in errors {
            let Some(pos) = self.valid.iter().position(|r| r.index == index) else {
                warn!("sink reported error for unknown or already-invalid index {index}");
                continue;
            };
            let Some(first) = details.first() else {
                continue;
            };
            let kind = classify_sink_error(first.code, first.retryable);
            let cause = details
                .iter()
                .map(|d| d.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");

            let mut record = self.valid.remove(pos);
            record.error = Some(ErrorDescriptor::new(kind, cause));
            self.invalid.push(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn sample_records() -> Records {
        Records {
            valid: vec![
                Record::valid(0, HashMap::new(), vec![("a".into(), Value::Integer(1))]),
                Record::valid(2, HashMap::new(), vec![("a".into(), Value::Integer(3))]),
            ],
            invalid: vec![Record::invalid(
                1,
                HashMap::new(),
                ErrorDescriptor::new(ErrorKind::Deserialization, "bad bytes"),
            )],
        }
    }

    #[test]
    fn test_ordered_merge() {
        let records = sample_records();
        let ordered = records.into_ordered();
        let indices: Vec<usize> = ordered.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(ordered[0].is_valid());
        assert!(!ordered[1].is_valid());
    }

    #[test]
    fn test_apply_sink_errors_moves_valid_to_invalid() {
        let mut records = sample_records();
        let mut errors = HashMap::new();
        errors.insert(
            2,
            vec![SinkErrorDetail {
                code: Some(400),
                retryable: false,
                message: "schema mismatch".to_string(),
            }],
        );

        records.apply_sink_errors(errors);

        assert_eq!(records.valid.len(), 1);
        assert_eq!(records.invalid.len(), 2);
        let moved = records.invalid.iter().find(|r| r.index == 2).unwrap();
        assert_eq!(moved.error.as_ref().unwrap().kind, ErrorKind::Sink4xx);
        // Output fields survive the move, schema evolution inspects them
        assert_eq!(moved.field("a"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_apply_sink_errors_ignores_unknown_index() {
        let mut records = sample_records();
        let mut errors = HashMap::new();
        errors.insert(
            7,
            vec![SinkErrorDetail {
                code: None,
                retryable: true,
                message: "quota".to_string(),
            }],
        );
        records.apply_sink_errors(errors);
        assert_eq!(records.valid.len(), 2);
        assert_eq!(records.invalid.len(), 1);
    }

    #[test]
    fn test_totality_counts() {
        let records = sample_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records.invalid_indices(), vec![1]);
    }
}

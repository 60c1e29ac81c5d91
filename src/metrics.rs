//! Metrics for batch conversion.

use crate::ErrorKind;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Metrics collector for the batch converter
#[derive(Debug, Clone)]
pub struct ConverterMetrics {
    /// Sink/connector name for labeling
    sink_name: String,
    /// Topic name for labeling
    topic: String,
}

impl ConverterMetrics {
    /// Create a new metrics collector
    pub fn new(sink_name: impl Into<String>, topic: impl Into<String>) -> Self {
        let sink_name = sink_name.into();
        let topic = topic.into();

        Self::register_metrics();

        Self { sink_name, topic }
    }

    /// Register metric descriptions
    fn register_metrics() {
        describe_counter!(
            "sinkbridge_messages_converted_total",
            "Total number of messages successfully converted to records"
        );
        describe_counter!(
            "sinkbridge_messages_failed_total",
            "Total number of messages that failed conversion, by error kind"
        );

        describe_histogram!(
            "sinkbridge_batch_size",
            "Number of messages in each converted batch"
        );
        describe_histogram!(
            "sinkbridge_batch_valid_size",
            "Number of valid records produced per batch"
        );
        describe_histogram!(
            "sinkbridge_conversion_duration_seconds",
            "Time spent converting each batch"
        );

        describe_gauge!(
            "sinkbridge_batch_validity_ratio",
            "Fraction of the last batch that converted successfully"
        );
    }

    /// Record one successfully converted message
    pub fn record_success(&self) {
        counter!(
            "sinkbridge_messages_converted_total",
            "sink" => self.sink_name.clone(),
            "topic" => self.topic.clone(),
        )
        .increment(1);
    }

    /// Record one failed message, labeled by its classified error kind
    pub fn record_error(&self, kind: ErrorKind) {
        counter!(
            "sinkbridge_messages_failed_total",
            "sink" => self.sink_name.clone(),
            "topic" => self.topic.clone(),
            "error_type" => kind.as_str(),
        )
        .increment(1);
    }

    /// Record batch-level outcomes
    pub fn record_batch(&self, batch_size: usize, valid: usize, duration: Duration) {
        histogram!(
            "sinkbridge_batch_size",
            "sink" => self.sink_name.clone(),
            "topic" => self.topic.clone(),
        )
        .record(batch_size as f64);
        histogram!(
            "sinkbridge_batch_valid_size",
            "sink" => self.sink_name.clone(),
            "topic" => self.topic.clone(),
        )
        .record(valid as f64);
        histogram!(
            "sinkbridge_conversion_duration_seconds",
            "sink" => self.sink_name.clone(),
            "topic" => self.topic.clone(),
        )
        .record(duration.as_secs_f64());
        if batch_size > 0 {
            gauge!(
                "sinkbridge_batch_validity_ratio",
                "sink" => self.sink_name.clone(),
                "topic" => self.topic.clone(),
            )
            .set(valid as f64 / batch_size as f64);
        }
    }
}

//! Metrics and observability utilities
//!
//! Prometheus-style metrics for the HTTP surface and the bulk import
//! pipeline, with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all PrintTrack metrics
pub const METRICS_PREFIX: &str = "printtrack";

/// Buckets for bulk import duration (in seconds)
pub const IMPORT_BUCKETS: &[f64] = &[
    0.010,  // 10ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    60.00,  // 1m
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Import metrics
    describe_counter!(
        format!("{}_import_batches_total", METRICS_PREFIX),
        Unit::Count,
        "Total bulk import batches by outcome"
    );

    describe_counter!(
        format!("{}_import_rows_accepted_total", METRICS_PREFIX),
        Unit::Count,
        "Rows persisted as SKU recipes"
    );

    describe_counter!(
        format!("{}_import_rows_rejected_total", METRICS_PREFIX),
        Unit::Count,
        "Rows rejected during bulk import"
    );

    describe_counter!(
        format!("{}_import_row_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Errors found on rejected import rows, by reason"
    );

    describe_counter!(
        format!("{}_sku_code_collisions_total", METRICS_PREFIX),
        Unit::Count,
        "SKU code inserts retried after colliding with another writer"
    );

    describe_histogram!(
        format!("{}_import_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Bulk import latency in seconds"
    );

    // Recipe and job metrics
    describe_counter!(
        format!("{}_recipes_created_total", METRICS_PREFIX),
        Unit::Count,
        "SKU recipes created through direct entry"
    );

    describe_counter!(
        format!("{}_jobs_created_total", METRICS_PREFIX),
        Unit::Count,
        "Production jobs created"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record the outcome of one bulk import batch
pub fn record_import(duration_secs: f64, accepted: usize, rejected: usize) {
    let status = if rejected == 0 { "completed" } else { "completed_with_errors" };

    counter!(
        format!("{}_import_batches_total", METRICS_PREFIX),
        "status" => status.to_string()
    )
    .increment(1);

    counter!(format!("{}_import_rows_accepted_total", METRICS_PREFIX))
        .increment(accepted as u64);

    counter!(format!("{}_import_rows_rejected_total", METRICS_PREFIX))
        .increment(rejected as u64);

    histogram!(format!("{}_import_duration_seconds", METRICS_PREFIX))
        .record(duration_secs);
}

/// Helper to record one error on a rejected import row. A row with several
/// errors records each of them; the row itself is counted by `record_import`.
pub fn record_row_error(reason: &str) {
    counter!(
        format!("{}_import_row_errors_total", METRICS_PREFIX),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Helper to record a SKU code collision retry
pub fn record_code_collision() {
    counter!(format!("{}_sku_code_collisions_total", METRICS_PREFIX)).increment(1);
}

/// Helper to record a directly created recipe
pub fn record_recipe_created() {
    counter!(format!("{}_recipes_created_total", METRICS_PREFIX)).increment(1);
}

/// Helper to record a created job
pub fn record_job_created() {
    counter!(format!("{}_jobs_created_total", METRICS_PREFIX)).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_import_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in IMPORT_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_helpers_without_recorder() {
        // No recorder installed: calls are no-ops and must not panic
        let metrics = RequestMetrics::start("POST", "/v1/recipes/bulk-upload");
        metrics.finish(200);
        record_import(0.2, 3, 1);
        record_row_error("duplicate_name");
        record_code_collision();
    }

    #[test]
    fn test_rejected_rows_counted_once_per_row() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            record_import(0.1, 2, 1);
            record_row_error("invalid_decimal");
            record_row_error("not_positive");
        });

        let rendered = handle.render();
        assert!(rendered.contains("printtrack_import_rows_accepted_total 2"));
        assert!(rendered.contains("printtrack_import_rows_rejected_total 1"));
        assert!(rendered.contains("printtrack_import_row_errors_total{reason=\"invalid_decimal\"} 1"));
        assert!(rendered.contains("printtrack_import_row_errors_total{reason=\"not_positive\"} 1"));
    }
}

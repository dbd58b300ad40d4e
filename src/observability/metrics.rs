//! Metric names and descriptions.
//!
//! # Metrics
//! - `up` (gauge): 1 while the process is serving
//! - `http_requests_total` (counter): requests by server, method, status
//! - `http_request_duration_seconds` (histogram): latency by server, method, status
//! - `panics_recovered_total` (counter): recovered panics by panic source
//!
//! # Design Decisions
//! - Recorded through `metrics::with_local_recorder`, never a global recorder
//! - Labels stay low-cardinality (route templates, not raw IDs)

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusRecorder};

pub const UP: &str = "up";
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const PANICS_RECOVERED_TOTAL: &str = "panics_recovered_total";

/// Build a recorder that is not installed as the global recorder.
pub(crate) fn recorder() -> PrometheusRecorder {
    PrometheusBuilder::new().build_recorder()
}

/// Register help text. Must run with the target recorder installed locally.
pub(crate) fn describe() {
    describe_gauge!(UP, "Whether the service is up");
    describe_counter!(HTTP_REQUESTS_TOTAL, "Total HTTP and gRPC requests served");
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Request latency"
    );
    describe_counter!(PANICS_RECOVERED_TOTAL, "Panics recovered by middleware");
}

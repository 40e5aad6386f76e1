//! Counters and histograms emitted by the hosting client.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! binary installs a recorder.

use std::time::Duration;

use metrics::{counter, histogram};

use crate::error::HostError;

pub const REQUESTS: &str = "host_requests_total";
pub const REQUEST_DURATION: &str = "host_request_duration_seconds";
pub const RETRIES: &str = "host_retries_total";
pub const UPLOADED_BYTES: &str = "host_uploaded_bytes_total";

/// Status label for a finished call. Errors without an HTTP status count as 0.
pub fn status_label<T>(result: &Result<T, HostError>) -> u16 {
    match result {
        Ok(_) => 200,
        Err(e) => e.http_status().unwrap_or(0),
    }
}

/// One finished call: outcome counter plus duration.
pub fn observe_request(operation: &str, status: u16, elapsed: Duration) {
    let op = operation.to_owned();
    counter!(REQUESTS, "operation" => op.clone(), "status" => status.to_string()).increment(1);
    histogram!(REQUEST_DURATION, "operation" => op).record(elapsed.as_secs_f64());
}

pub fn count_retry(operation: &str) {
    counter!(RETRIES, "operation" => operation.to_owned()).increment(1);
}

/// Bytes the upload endpoint confirmed.
pub fn count_uploaded_bytes(bytes: u64) {
    counter!(UPLOADED_BYTES).increment(bytes);
}

//! Prometheus metrics for delivered responses.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `missive_responses_total` | Counter | `status` | Responses delivered |
//! | `missive_response_size_bytes` | Histogram | - | Encoded envelope size |
//! | `missive_response_trace_entries` | Histogram | - | Trace entries per response |
//!
//! The names are recorded by [`MetricsInterceptor`](crate::MetricsInterceptor).
//! Without an installed recorder, recording is a no-op.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use ::metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use parking_lot::Mutex;
use std::sync::OnceLock;

/// Counter of delivered responses, labelled by status code.
pub const RESPONSES_TOTAL: &str = "missive_responses_total";

/// Histogram of encoded response sizes.
pub const RESPONSE_SIZE_BYTES: &str = "missive_response_size_bytes";

/// Histogram of trace entries per response.
pub const RESPONSE_TRACE_ENTRIES: &str = "missive_response_trace_entries";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Serializes recorder installation so only one caller ever installs.
static INSTALL_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Installs a Prometheus recorder as the global `metrics` recorder.
///
/// Subsequent calls, concurrent ones included, return the handle installed
/// by the first.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if a different recorder is
/// already installed.
pub fn init_metrics() -> TelemetryResult<&'static PrometheusHandle> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle);
    }

    let _install = INSTALL_LOCK.lock();
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    register_metric_descriptions();

    Ok(METRICS_HANDLE.get_or_init(|| handle))
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if [`init_metrics`] has not run.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(RESPONSES_TOTAL, "Total number of responses delivered");
    describe_histogram!(
        RESPONSE_SIZE_BYTES,
        Unit::Bytes,
        "Encoded size of delivered responses"
    );
    describe_histogram!(
        RESPONSE_TRACE_ENTRIES,
        "Number of trace entries on delivered responses"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert_eq!(RESPONSES_TOTAL, "missive_responses_total");
        assert!(RESPONSE_SIZE_BYTES.starts_with("missive_"));
        assert!(RESPONSE_TRACE_ENTRIES.starts_with("missive_"));
    }

    #[test]
    fn test_concurrent_init_returns_one_handle() {
        let handles: Vec<&PrometheusHandle> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8).map(|_| scope.spawn(init_metrics)).collect();
            workers
                .into_iter()
                .map(|worker| worker.join().unwrap().unwrap())
                .collect()
        });

        assert!(handles.windows(2).all(|pair| std::ptr::eq(pair[0], pair[1])));
        assert!(render_metrics().is_some());
    }
}

//! Ready-made interceptors for logging and metrics.
//!
//! Register them on a [`Courier`](missive_delivery::Courier) at startup:
//!
//! ```
//! use missive_delivery::Courier;
//! use missive_telemetry::{LoggingInterceptor, MetricsInterceptor};
//!
//! let courier = Courier::new();
//! courier.register(LoggingInterceptor::new("users-api")).unwrap();
//! courier.register(MetricsInterceptor::new()).unwrap();
//! assert_eq!(courier.interceptors(), vec!["logging", "metrics"]);
//! ```

use http::StatusCode;
use ::metrics::{counter, histogram};
use missive_core::{RequestContext, Response};
use missive_delivery::Interceptor;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::logging::{fields, LogConfig};
use crate::metrics::{RESPONSES_TOTAL, RESPONSE_SIZE_BYTES, RESPONSE_TRACE_ENTRIES};

/// Emits one structured `tracing` event per delivered response.
///
/// Server errors log at `warn`, everything else at `info`.
#[derive(Debug, Clone)]
pub struct LoggingInterceptor {
    service: String,
}

impl LoggingInterceptor {
    /// Creates a logging interceptor tagging events with `service`.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Creates a logging interceptor from the logging configuration.
    pub fn from_config(config: &LogConfig) -> Self {
        Self::new(config.service_name.clone())
    }
}

impl Default for LoggingInterceptor {
    fn default() -> Self {
        Self::from_config(&LogConfig::default())
    }
}

impl Interceptor for LoggingInterceptor {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn intercept(&self, ctx: Option<&RequestContext>, response: &Response, status: StatusCode) {
        let request_id = ctx
            .and_then(RequestContext::request_id)
            .map(|id| id.to_string());
        let operation_id = ctx.and_then(RequestContext::operation_id);

        if status.is_server_error() {
            tracing::warn!(
                { fields::SERVICE_NAME } = %self.service,
                { fields::STATUS_CODE } = status.as_u16(),
                response_message = response.message(),
                module = response.module(),
                { fields::TRACE_COUNT } = response.trace().len(),
                { fields::REQUEST_ID } = request_id.as_deref(),
                { fields::OPERATION_ID } = operation_id,
                "response delivered with server error"
            );
        } else {
            tracing::info!(
                { fields::SERVICE_NAME } = %self.service,
                { fields::STATUS_CODE } = status.as_u16(),
                response_message = response.message(),
                module = response.module(),
                { fields::TRACE_COUNT } = response.trace().len(),
                { fields::REQUEST_ID } = request_id.as_deref(),
                { fields::OPERATION_ID } = operation_id,
                "response delivered"
            );
        }
    }
}

/// Records Prometheus metrics for every delivered response.
///
/// Also keeps its own count of observed responses, which is available
/// whether or not a global recorder is installed.
#[derive(Debug, Default)]
pub struct MetricsInterceptor {
    observed: AtomicU64,
}

impl MetricsInterceptor {
    /// Creates a metrics interceptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of responses this interceptor has seen.
    pub fn observed(&self) -> u64 {
        self.observed.load(Ordering::Relaxed)
    }
}

impl Interceptor for MetricsInterceptor {
    fn name(&self) -> &'static str {
        "metrics"
    }

    fn intercept(&self, _ctx: Option<&RequestContext>, response: &Response, status: StatusCode) {
        self.observed.fetch_add(1, Ordering::Relaxed);

        counter!(RESPONSES_TOTAL, "status" => status.as_u16().to_string()).increment(1);
        histogram!(RESPONSE_TRACE_ENTRIES).record(response.trace().len() as f64);
        if let Ok(size) = response.estimate_size() {
            histogram!(RESPONSE_SIZE_BYTES).record(size as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use missive_core::{ConfigStore, RequestId};
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn store() -> Arc<ConfigStore> {
        Arc::new(ConfigStore::new())
    }

    #[test]
    #[traced_test]
    fn test_logging_interceptor_fields() {
        let response = Response::not_found(&store(), "missing").with_module("users");
        let ctx = RequestContext::with_request_id(RequestId::new()).with_operation_id("getUser");

        LoggingInterceptor::new("users-api").intercept(Some(&ctx), &response, response.status());

        assert!(logs_contain("response delivered"));
        assert!(logs_contain("status_code=404"));
        assert!(logs_contain("users-api"));
        assert!(logs_contain("getUser"));
        for field in [
            fields::SERVICE_NAME,
            fields::REQUEST_ID,
            fields::OPERATION_ID,
            fields::TRACE_COUNT,
        ] {
            assert!(logs_contain(&format!("{field}=")), "missing {field}");
        }
    }

    #[test]
    #[traced_test]
    fn test_logging_interceptor_server_error() {
        let response = Response::internal_server_error(&store(), "boom");
        LoggingInterceptor::default().intercept(None, &response, response.status());

        assert!(logs_contain("response delivered with server error"));
        assert!(logs_contain("status_code=500"));
    }

    #[test]
    fn test_metrics_interceptor_counts_without_recorder() {
        let interceptor = MetricsInterceptor::new();
        let response = Response::ok(&store(), "fine");

        interceptor.intercept(None, &response, response.status());
        interceptor.intercept(None, &response, response.status());

        assert_eq!(interceptor.observed(), 2);
    }

    #[test]
    fn test_interceptor_names() {
        assert_eq!(LoggingInterceptor::default().name(), "logging");
        assert_eq!(MetricsInterceptor::new().name(), "metrics");
    }
}

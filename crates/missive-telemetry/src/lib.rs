//! Observability for Missive.
//!
//! - **Logging**: `tracing-subscriber` setup with JSON or pretty output
//! - **Metrics**: Prometheus recorder via `metrics-exporter-prometheus`
//! - **Interceptors**: [`LoggingInterceptor`] and [`MetricsInterceptor`]
//!   observe every delivered response
//!
//! # Example
//!
//! ```rust,ignore
//! use missive_delivery::Courier;
//! use missive_telemetry::{init_logging, init_metrics, LogConfig, LoggingInterceptor, MetricsInterceptor};
//!
//! let log_config = LogConfig::production();
//! init_logging(&log_config)?;
//! init_metrics()?;
//!
//! let courier = Courier::new();
//! courier.register(LoggingInterceptor::from_config(&log_config))?;
//! courier.register(MetricsInterceptor::new())?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod interceptors;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use interceptors::{LoggingInterceptor, MetricsInterceptor};
pub use logging::{init_logging, LogConfig};
pub use crate::metrics::{init_metrics, render_metrics};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

//! # Missive
//!
//! **Uniform JSON response envelopes for HTTP services**
//!
//! Missive gives every reply the same shape and keeps it within bounds:
//!
//! - **Envelope** – `message`, `data`, `trace`, `timestamp`, `pagination`, `code`
//! - **Bounded trace** – caller entries truncate with a marker, internal entries overwrite the last slot
//! - **Size guard** – oversized responses are replaced by a 500 before anything is written
//! - **Interceptors** – ordered observers run right before every send
//! - **Layered config** – defaults, TOML/JSON file, then environment variables
//!
//! ## Quick Start
//!
//! ```
//! use missive::prelude::*;
//!
//! let courier = Courier::new();
//! let response = courier
//!     .not_found("missing")
//!     .add_prefixed_trace("lookup", ["id=42"]);
//!
//! let (http, report) = courier.respond(response, None);
//! assert_eq!(http.status(), 404);
//! assert!(report.is_delivered());
//! ```
//!
//! ## Delivery
//!
//! ```text
//! Handler → Response builder → Courier::send
//!                                  │
//!            resolve config → size guard → interceptors → status/header/body
//! ```

#![doc(html_root_url = "https://docs.rs/missive/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export envelope types
pub use missive_core as core;

// Re-export delivery types
pub use missive_delivery as delivery;

// Re-export configuration loading
pub use missive_config as config;

// Re-export observability
pub use missive_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```
/// use missive::prelude::*;
/// ```
pub mod prelude {
    pub use missive_core::{
        ConfigStore, MissiveError, MissiveResult, PaginationMeta, PaginationParams,
        ReceivedEnvelope, RequestContext, RequestId, Response, ResponseConfig, ValidationTrace,
    };

    pub use missive_delivery::{
        BufferedDestination, Courier, DeliveryOutcome, DeliveryReport, Destination,
        FnInterceptor, Interceptor,
    };

    pub use missive_config::{ConfigLoader, MissiveConfig};

    pub use missive_telemetry::{LogConfig, LoggingInterceptor, MetricsInterceptor};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_round_trip() {
        let courier = Courier::new();
        let response = courier
            .ok("listed")
            .with_data(vec![1, 2, 3])
            .paginate(PaginationParams::from_query("page=2&limit=3"), 9);

        let mut destination = BufferedDestination::new();
        let report = courier.send(response, None, &mut destination);
        assert!(report.is_delivered());

        let (envelope, data) = missive_core::extract::<Vec<u32>>(destination.body()).unwrap();
        assert_eq!(data, Some(vec![1, 2, 3]));
        let pagination = envelope.pagination.unwrap();
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.prev_page, Some(1));
        assert_eq!(pagination.next_page, Some(3));
    }

    #[test]
    fn test_config_feeds_courier() {
        let config = ConfigLoader::new()
            .with_string("[response]\nmax_trace_size = 2\n", "toml")
            .unwrap()
            .load()
            .unwrap();

        let courier = Courier::with_config(config.response_config());
        let response = courier.bad_request("nope").add_trace(["a", "b", "c"]);
        assert_eq!(
            response.trace(),
            ["trace: a", "Error: (trace truncated, max size: 2)"]
        );
    }
}

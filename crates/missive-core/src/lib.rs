//! # Missive Core
//!
//! Core types for building uniform JSON response envelopes.
//!
//! This crate provides the pieces every Missive response is made of:
//!
//! - [`Response`] - The envelope and its builder methods
//! - [`ConfigStore`] / [`ResponseConfig`] - Process-wide limits and per-response overrides
//! - [`trace::TraceBuffer`] - Bounded, prefixed diagnostic trail
//! - [`size`] - Encoded-size estimation and the size guard
//! - [`PaginationParams`] / [`PaginationMeta`] - List pagination
//! - [`ValidationTrace`] - Field validation failures
//! - [`ReceivedEnvelope`] - Decoding envelopes on the client side
//! - [`MissiveError`] - Standard error types
//!
//! Delivery to a transport lives in `missive-delivery`.

#![doc(html_root_url = "https://docs.rs/missive-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod context;
mod error;
pub mod pagination;
mod parsing;
mod response;
pub mod size;
pub mod trace;
mod validation;

pub use config::{
    ConfigStore, ResponseConfig, DEFAULT_CONTENT_TYPE, DEFAULT_MAX_INTERCEPTOR_AMOUNT,
    DEFAULT_MAX_TRACE_SIZE, DEFAULT_RESPONSE_SIZE_LIMIT,
};
pub use context::{RequestContext, RequestId};
pub use error::{ErrorCategory, MissiveError, MissiveResult};
pub use pagination::{PaginationMeta, PaginationParams};
pub use parsing::{extract, ReceivedEnvelope};
pub use response::{
    validate_status_code, Response, ResponseStats, MAX_STATUS_CODE, MIN_STATUS_CODE,
};
pub use validation::ValidationTrace;

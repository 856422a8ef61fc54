//! The response envelope and its builder methods.
//!
//! A [`Response`] is created through a status-named constructor, refined
//! with `with_*` calls, and finally handed to the delivery pipeline. Every
//! builder method takes `self` by value and returns it, so a chain reads top
//! to bottom and the response cannot be touched once it has been sent.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "module": "users",
//!   "message": "missing",
//!   "data": {"id": 42},
//!   "trace": ["lookup: id=42"],
//!   "timestamp": "2024-01-01T00:00:00Z",
//!   "pagination": {"page": 1, "limit": 20, "total": 0, "total_pages": 0,
//!                  "has_next": false, "has_prev": false},
//!   "code": 404
//! }
//! ```
//!
//! `module`, `message`, `data`, `trace` and `pagination` are omitted when
//! unset. The content type only drives the emitted header.

use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;
use std::sync::Arc;

use crate::pagination::{PaginationMeta, PaginationParams};
use crate::trace::{TraceBuffer, TraceMode, TraceText, DEFAULT_TRACE_PREFIX};
use crate::{size, ConfigStore, MissiveError, MissiveResult, ResponseConfig};

/// Lowest status code a response may carry.
pub const MIN_STATUS_CODE: u16 = 100;

/// Highest status code a response may carry.
pub const MAX_STATUS_CODE: u16 = 599;

/// Checks that `code` lies in [100, 599].
pub fn validate_status_code(code: u16) -> MissiveResult<StatusCode> {
    if !(MIN_STATUS_CODE..=MAX_STATUS_CODE).contains(&code) {
        return Err(MissiveError::InvalidStatusCode { code });
    }
    StatusCode::from_u16(code).map_err(|_| MissiveError::InvalidStatusCode { code })
}

/// Attached payload.
///
/// The payload is encoded once, when attached, by the same encoder that
/// writes the body, and kept as raw JSON text. Field order and numbers the
/// JSON data model cannot hold (`u128`) survive unchanged. A payload the
/// encoder rejects keeps the reason, and fails again whenever the response
/// is encoded.
#[derive(Debug, Clone)]
enum Payload {
    Raw(Box<RawValue>),
    Unencodable(String),
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Raw(raw) => raw.serialize(serializer),
            Self::Unencodable(reason) => Err(S::Error::custom(reason)),
        }
    }
}

fn serialize_status<S: Serializer>(code: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(code.as_u16())
}

/// A response envelope under construction.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use missive_core::{ConfigStore, Response};
///
/// let store = Arc::new(ConfigStore::new());
/// let response = Response::not_found(&store, "missing")
///     .with_module("users")
///     .add_prefixed_trace("lookup", ["id=42"]);
///
/// assert_eq!(response.code(), 404);
/// assert_eq!(response.trace(), ["lookup: id=42"]);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "String::is_empty")]
    module: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Payload>,

    #[serde(skip_serializing_if = "TraceBuffer::is_empty")]
    trace: TraceBuffer,

    timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<PaginationMeta>,

    #[serde(serialize_with = "serialize_status")]
    code: StatusCode,

    #[serde(skip)]
    content_type: String,

    #[serde(skip)]
    trace_prefix: String,

    /// Per-response override; all-zero means "use the store".
    #[serde(skip)]
    config: ResponseConfig,

    #[serde(skip)]
    store: Arc<ConfigStore>,
}

macro_rules! status_constructors {
    ($($(#[$meta:meta])* $name:ident => $status:ident;)*) => {
        impl Response {
            $(
                $(#[$meta])*
                pub fn $name(store: &Arc<ConfigStore>, message: impl Into<String>) -> Self {
                    Self::create(store, StatusCode::$status, message)
                }
            )*
        }
    };
}

status_constructors! {
    /// 200 OK.
    ok => OK;
    /// 201 Created.
    created => CREATED;
    /// 202 Accepted.
    accepted => ACCEPTED;
    /// 204 No Content.
    no_content => NO_CONTENT;
    /// 400 Bad Request.
    bad_request => BAD_REQUEST;
    /// 401 Unauthorized.
    unauthorized => UNAUTHORIZED;
    /// 402 Payment Required.
    payment_required => PAYMENT_REQUIRED;
    /// 403 Forbidden.
    forbidden => FORBIDDEN;
    /// 404 Not Found.
    not_found => NOT_FOUND;
    /// 405 Method Not Allowed.
    method_not_allowed => METHOD_NOT_ALLOWED;
    /// 409 Conflict.
    conflict => CONFLICT;
    /// 422 Unprocessable Entity.
    unprocessable_entity => UNPROCESSABLE_ENTITY;
    /// 429 Too Many Requests.
    too_many_requests => TOO_MANY_REQUESTS;
    /// 500 Internal Server Error.
    internal_server_error => INTERNAL_SERVER_ERROR;
    /// 501 Not Implemented.
    not_implemented => NOT_IMPLEMENTED;
    /// 502 Bad Gateway.
    bad_gateway => BAD_GATEWAY;
    /// 503 Service Unavailable.
    service_unavailable => SERVICE_UNAVAILABLE;
}

impl Response {
    fn create(store: &Arc<ConfigStore>, code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            module: String::new(),
            message: message.into(),
            data: None,
            trace: TraceBuffer::new(),
            timestamp: Utc::now(),
            pagination: None,
            code,
            content_type: store.read().default_content_type,
            trace_prefix: String::new(),
            config: ResponseConfig::unset(),
            store: Arc::clone(store),
        }
    }

    /// Returns the module tag, if any.
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        Some(self.module.as_str()).filter(|m| !m.is_empty())
    }

    /// Returns the message (empty when unset).
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the attached payload decoded as a JSON value.
    ///
    /// `None` both when nothing is attached and when the attached payload
    /// could not be encoded.
    #[must_use]
    pub fn data(&self) -> Option<serde_json::Value> {
        match &self.data {
            Some(Payload::Raw(raw)) => serde_json::from_str(raw.get()).ok(),
            _ => None,
        }
    }

    /// Returns the attached payload exactly as it will be written.
    #[must_use]
    pub fn raw_data(&self) -> Option<&str> {
        match &self.data {
            Some(Payload::Raw(raw)) => Some(raw.get()),
            _ => None,
        }
    }

    /// Returns the trace entries.
    #[must_use]
    pub fn trace(&self) -> &[String] {
        self.trace.entries()
    }

    /// Returns the creation time.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the pagination block, if attached.
    #[must_use]
    pub const fn pagination(&self) -> Option<&PaginationMeta> {
        self.pagination.as_ref()
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.code
    }

    /// Returns the numeric status code.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.code.as_u16()
    }

    /// Returns the media type used for the `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the per-response trace prefix, if set.
    #[must_use]
    pub fn trace_prefix(&self) -> Option<&str> {
        Some(self.trace_prefix.as_str()).filter(|p| !p.is_empty())
    }

    /// Returns the configuration store this response reads defaults from.
    #[must_use]
    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Returns the configuration in effect for this response.
    #[must_use]
    pub fn resolved_config(&self) -> ResponseConfig {
        self.store.resolve(&self.config)
    }

    fn trace_capacity(&self) -> usize {
        if self.config.is_unset() {
            self.store.read().max_trace_size
        } else {
            self.config.max_trace_size
        }
    }

    /// Sets the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attaches a payload.
    ///
    /// A payload that serializes to `null` counts as no payload.
    pub fn with_data<T: Serialize>(mut self, data: T) -> Self {
        self.data = match serde_json::value::to_raw_value(&data) {
            Ok(raw) if raw.get() == "null" => None,
            Ok(raw) => Some(Payload::Raw(raw)),
            Err(error) => {
                tracing::debug!(error = %error, "payload cannot be encoded");
                Some(Payload::Unencodable(error.to_string()))
            }
        };
        self
    }

    /// Overrides the content type of this response.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Sets the module tag.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// Attaches a pagination block.
    pub fn with_pagination(mut self, pagination: PaginationMeta) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Computes and attaches a pagination block for `total` items.
    pub fn paginate(self, params: PaginationParams, total: u64) -> Self {
        self.with_pagination(PaginationMeta::from_params(params, total))
    }

    /// Sets the prefix used by [`Response::add_trace`].
    pub fn with_trace_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.trace_prefix = prefix.into();
        self
    }

    /// Applies a per-response configuration override.
    ///
    /// The override is normalized first, so it always counts as set. When the
    /// response still carries the process-default content type, it switches
    /// to the override's default content type.
    pub fn with_config(mut self, config: ResponseConfig) -> Self {
        let config = config.normalized();
        if self.content_type.is_empty()
            || self.content_type == self.store.read().default_content_type
        {
            self.content_type = config.default_content_type.clone();
        }
        self.config = config;
        self
    }

    /// Appends caller-facing trace entries under the response's trace prefix
    /// (or `"trace"` when none is set).
    pub fn add_trace<I>(self, entries: I) -> Self
    where
        I: IntoIterator,
        I::Item: TraceText,
    {
        let prefix = self.trace_prefix().unwrap_or(DEFAULT_TRACE_PREFIX).to_string();
        self.append_trace(&prefix, TraceMode::Caller, entries)
    }

    /// Appends caller-facing trace entries under an explicit prefix (or
    /// `"trace"` when `prefix` is empty).
    pub fn add_prefixed_trace<I>(self, prefix: &str, entries: I) -> Self
    where
        I: IntoIterator,
        I::Item: TraceText,
    {
        let prefix = if prefix.is_empty() {
            DEFAULT_TRACE_PREFIX
        } else {
            prefix
        };
        self.append_trace(prefix, TraceMode::Caller, entries)
    }

    /// Appends library diagnostics. Once the trace is full, each entry
    /// overwrites the last slot instead of being dropped.
    pub fn append_internal_trace<I>(self, prefix: &str, entries: I) -> Self
    where
        I: IntoIterator,
        I::Item: TraceText,
    {
        self.append_trace(prefix, TraceMode::Internal, entries)
    }

    fn append_trace<I>(mut self, prefix: &str, mode: TraceMode, entries: I) -> Self
    where
        I: IntoIterator,
        I::Item: TraceText,
    {
        let capacity = self.trace_capacity();
        self.trace.append(capacity, prefix, mode, entries);
        self
    }

    /// Sets an explicit status code.
    ///
    /// A code outside [100, 599] replaces this response with an internal
    /// error carrying an `error: invalid HTTP status code: <code>` trace.
    pub fn with_code(mut self, code: u16) -> Self {
        match validate_status_code(code) {
            Ok(status) => {
                self.code = status;
                self
            }
            Err(error) => {
                tracing::warn!(code, "rejected explicit status code");
                self.into_internal_error("Invalid status code set", "error", &error)
            }
        }
    }

    /// Re-pins the response to `status` with a new message.
    pub fn with_status(self, status: StatusCode, message: impl Into<String>) -> Self {
        let response = self.with_code(status.as_u16());
        if response.code == status {
            response.with_message(message)
        } else {
            response
        }
    }

    /// Replaces this response with a fresh internal error.
    ///
    /// The replacement keeps the content type and configuration override and
    /// records `error` as an internal trace entry under `prefix`. Everything
    /// else, payload included, is dropped.
    pub fn into_internal_error(self, message: &str, prefix: &str, error: &MissiveError) -> Self {
        let mut replacement = Self::create(&self.store, StatusCode::INTERNAL_SERVER_ERROR, message);
        replacement.content_type = self.content_type;
        replacement.config = self.config;
        replacement.append_internal_trace(prefix, [error])
    }

    /// Returns the encoded size of this response in bytes.
    pub fn estimate_size(&self) -> MissiveResult<usize> {
        size::estimate(self)
    }

    /// Runs the size guard against the resolved configuration.
    pub fn validate_size(&self) -> MissiveResult<Option<usize>> {
        size::validate(self, &self.resolved_config())
    }

    /// Returns `true` if the trace fits its capacity and, with size
    /// validation enabled, the encoded size fits the limit.
    #[must_use]
    pub fn is_within_limits(&self) -> bool {
        let config = self.resolved_config();
        self.trace.len() <= config.max_trace_size && size::validate(self, &config).is_ok()
    }

    /// Returns a summary for inspection and logging.
    #[must_use]
    pub fn stats(&self) -> ResponseStats {
        ResponseStats {
            size_bytes: self.estimate_size().unwrap_or(0),
            trace_count: self.trace.len(),
            content_type: self.content_type.clone(),
            status_code: self.code(),
        }
    }
}

/// Summary of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseStats {
    /// Encoded size in bytes (0 if the response cannot be encoded).
    pub size_bytes: usize,
    /// Number of trace entries.
    pub trace_count: usize,
    /// Media type of the response.
    pub content_type: String,
    /// Numeric status code.
    pub status_code: u16,
}

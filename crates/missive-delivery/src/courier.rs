//! The delivery pipeline.
//!
//! A [`Courier`] owns the configuration store and the interceptor registry.
//! Handlers build responses through it and hand them back to
//! [`Courier::send`], which runs the fixed sequence:
//!
//! ```text
//! resolve config → size guard → interceptors → status/header/body → finalize
//! ```
//!
//! `send` never fails. An oversized or unencodable response is swapped for
//! an internal error before interceptors see it, and a failure while
//! writing the body is recorded on the returned response.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use missive_core::{
    ConfigStore, MissiveError, MissiveResult, RequestContext, Response, ResponseConfig,
    ValidationTrace, DEFAULT_CONTENT_TYPE,
};
use std::sync::Arc;

use crate::destination::{BufferedDestination, Destination, HttpResponse};
use crate::interceptor::{Interceptor, InterceptorRegistry};

/// Message of the response substituted for one that failed the size guard.
pub const LIMIT_EXCEEDED_MESSAGE: &str = "Response exceeded configured limits";

/// Message of the response substituted for one whose payload cannot be
/// encoded.
pub const ENCODING_FAILED_MESSAGE: &str = "Response could not be encoded";

/// Prefix of trace entries recorded by the pipeline itself.
pub const INTERNAL_ERROR_PREFIX: &str = "internal error";

/// How a delivery ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Status, header and body were all written.
    Delivered,
    /// Status and header were written but the body could not be encoded or
    /// written.
    DeliveredWithEncodeError,
}

/// Result of [`Courier::send`].
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    /// How the delivery ended.
    pub outcome: DeliveryOutcome,
    /// The response that was actually emitted, including any trace entries
    /// the pipeline appended.
    pub response: Response,
}

impl DeliveryReport {
    /// Returns `true` if the body was written.
    pub fn is_delivered(&self) -> bool {
        self.outcome == DeliveryOutcome::Delivered
    }
}

/// Builds and delivers responses against one configuration store and one
/// interceptor registry.
///
/// Cloning is cheap; clones share the store and the registry.
///
/// # Example
///
/// ```
/// use missive_delivery::{BufferedDestination, Courier};
///
/// let courier = Courier::new();
/// let response = courier
///     .not_found("missing")
///     .add_prefixed_trace("lookup", ["id=42"]);
///
/// let mut destination = BufferedDestination::new();
/// let report = courier.send(response, None, &mut destination);
///
/// assert!(report.is_delivered());
/// assert_eq!(destination.status(), 404);
/// ```
#[derive(Debug, Clone)]
pub struct Courier {
    store: Arc<ConfigStore>,
    registry: Arc<InterceptorRegistry>,
}

impl Default for Courier {
    fn default() -> Self {
        Self::new()
    }
}

impl Courier {
    /// Creates a courier with the built-in defaults and no interceptors.
    pub fn new() -> Self {
        Self::with_store(Arc::new(ConfigStore::new()))
    }

    /// Creates a courier starting from `config` (normalized).
    pub fn with_config(config: ResponseConfig) -> Self {
        Self::with_store(Arc::new(ConfigStore::with_config(config)))
    }

    /// Creates a courier over an existing store.
    pub fn with_store(store: Arc<ConfigStore>) -> Self {
        let registry = Arc::new(InterceptorRegistry::new(Arc::clone(&store)));
        Self { store, registry }
    }

    /// Returns the configuration store.
    pub const fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Returns the interceptor registry.
    pub const fn registry(&self) -> &Arc<InterceptorRegistry> {
        &self.registry
    }

    /// Returns a snapshot of the process-wide configuration.
    pub fn config(&self) -> ResponseConfig {
        self.store.read()
    }

    /// Replaces the process-wide configuration (normalized).
    pub fn update_config(&self, config: ResponseConfig) {
        self.store.update(config);
    }

    /// Registers an interceptor.
    pub fn register<I: Interceptor>(&self, interceptor: I) -> MissiveResult<()> {
        self.registry.register(interceptor)
    }

    /// Removes every interceptor.
    pub fn clear_interceptors(&self) {
        self.registry.clear();
    }

    /// Returns the registered interceptor names, in order.
    pub fn interceptors(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    /// Builds a 400 validation-failure response.
    pub fn validation_failed<I>(&self, errors: I) -> Response
    where
        I: IntoIterator<Item = ValidationTrace>,
    {
        Response::validation_failed(&self.store, errors)
    }

    /// Delivers `response` to `destination`.
    ///
    /// `ctx` is forwarded to interceptors only when it is non-empty.
    pub fn send<D>(
        &self,
        response: Response,
        ctx: Option<&RequestContext>,
        destination: &mut D,
    ) -> DeliveryReport
    where
        D: Destination + ?Sized,
    {
        let response = guard(response);
        let ctx = ctx.filter(|ctx| !ctx.is_empty());

        for interceptor in self.registry.snapshot() {
            tracing::debug!(interceptor = interceptor.name(), "running interceptor");
            interceptor.intercept(ctx, &response, response.status());
        }

        match emit(&response, destination) {
            Ok(()) => {
                tracing::debug!(status_code = response.code(), "response delivered");
                DeliveryReport {
                    outcome: DeliveryOutcome::Delivered,
                    response,
                }
            }
            Err(error) => {
                tracing::warn!(
                    status_code = response.code(),
                    error = %error,
                    "response body could not be written"
                );
                DeliveryReport {
                    outcome: DeliveryOutcome::DeliveredWithEncodeError,
                    response: response.append_internal_trace(INTERNAL_ERROR_PREFIX, [error]),
                }
            }
        }
    }

    /// Delivers `response` into a fresh [`BufferedDestination`] and returns
    /// the resulting HTTP response together with the report.
    pub fn respond(
        &self,
        response: Response,
        ctx: Option<&RequestContext>,
    ) -> (HttpResponse, DeliveryReport) {
        let mut destination = BufferedDestination::new();
        let report = self.send(response, ctx, &mut destination);
        (destination.into_response(), report)
    }
}

macro_rules! courier_constructors {
    ($($name:ident),* $(,)?) => {
        impl Courier {
            $(
                #[doc = concat!("Builds a response with [`Response::", stringify!($name), "`].")]
                pub fn $name(&self, message: impl Into<String>) -> Response {
                    Response::$name(&self.store, message)
                }
            )*
        }
    };
}

courier_constructors! {
    ok,
    created,
    accepted,
    no_content,
    bad_request,
    unauthorized,
    payment_required,
    forbidden,
    not_found,
    method_not_allowed,
    conflict,
    unprocessable_entity,
    too_many_requests,
    internal_server_error,
    not_implemented,
    bad_gateway,
    service_unavailable,
}

fn guard(response: Response) -> Response {
    match response.validate_size() {
        Ok(_) => response,
        Err(error) => {
            tracing::warn!(
                status_code = response.code(),
                error = %error,
                "response failed the size guard, substituting internal error"
            );
            let message = match &error {
                MissiveError::Encoding { .. } => ENCODING_FAILED_MESSAGE,
                _ => LIMIT_EXCEEDED_MESSAGE,
            };
            response.into_internal_error(message, INTERNAL_ERROR_PREFIX, &error)
        }
    }
}

fn emit<D>(response: &Response, destination: &mut D) -> MissiveResult<()>
where
    D: Destination + ?Sized,
{
    destination.set_status(response.status());

    let content_type = HeaderValue::from_str(response.content_type()).unwrap_or_else(|_| {
        tracing::warn!(
            content_type = response.content_type(),
            "content type is not a valid header value, using default"
        );
        HeaderValue::from_static(DEFAULT_CONTENT_TYPE)
    });
    destination.set_header(CONTENT_TYPE, content_type);

    let body = serde_json::to_vec(response).map_err(MissiveError::encoding)?;
    destination
        .write_body(Bytes::from(body))
        .map_err(MissiveError::encoding)
}

//! # Missive Delivery
//!
//! Delivery of Missive response envelopes.
//!
//! - [`Courier`] - Owns configuration and interceptors; builds and sends responses
//! - [`Interceptor`] / [`InterceptorRegistry`] - Observers run before every send
//! - [`Destination`] / [`BufferedDestination`] - Where the encoded response goes
//!
//! ## Pipeline
//!
//! | Step | Purpose |
//! |------|---------|
//! | 1 | Resolve the configuration in effect for the response |
//! | 2 | Size guard; substitute an internal error on violation |
//! | 3 | Run interceptors in registration order |
//! | 4 | Write status, `Content-Type` and the JSON body |
//! | 5 | Record an encode or write failure on the response |

#![doc(html_root_url = "https://docs.rs/missive-delivery/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod courier;
pub mod destination;
pub mod interceptor;

pub use courier::{Courier, DeliveryOutcome, DeliveryReport};
pub use destination::{BufferedDestination, Destination, HttpResponse};
pub use interceptor::{FnInterceptor, Interceptor, InterceptorRegistry};

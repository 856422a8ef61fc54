//! Where delivered responses go.
//!
//! The pipeline calls a [`Destination`] in a fixed order: status, then the
//! `Content-Type` header, then the body. [`BufferedDestination`] collects
//! those calls into an [`http::Response`] that any hyper-based server can
//! return directly.

use bytes::{Bytes, BytesMut};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use std::io;

/// The HTTP response type produced by [`BufferedDestination`].
pub type HttpResponse = http::Response<Full<Bytes>>;

/// A sink for one delivered response.
///
/// Each method is called at most once per delivery, in declaration order.
pub trait Destination {
    /// Records the status code.
    fn set_status(&mut self, status: StatusCode);

    /// Records a header.
    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Writes the encoded body.
    fn write_body(&mut self, body: Bytes) -> io::Result<()>;
}

impl<D: Destination + ?Sized> Destination for &mut D {
    fn set_status(&mut self, status: StatusCode) {
        (**self).set_status(status);
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        (**self).set_header(name, value);
    }

    fn write_body(&mut self, body: Bytes) -> io::Result<()> {
        (**self).write_body(body)
    }
}

/// A destination that keeps everything in memory.
#[derive(Debug, Clone)]
pub struct BufferedDestination {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl Default for BufferedDestination {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }
}

impl BufferedDestination {
    /// Creates an empty destination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded status (200 until set).
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the recorded headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Converts the recorded parts into an HTTP response.
    pub fn into_response(self) -> HttpResponse {
        let mut response = http::Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Destination for BufferedDestination {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    fn write_body(&mut self, body: Bytes) -> io::Result<()> {
        self.body.extend_from_slice(&body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;

    #[test]
    fn test_default_is_empty_ok() {
        let destination = BufferedDestination::new();
        assert_eq!(destination.status(), StatusCode::OK);
        assert!(destination.headers().is_empty());
        assert!(destination.body().is_empty());
    }

    #[test]
    fn test_into_response() {
        let mut destination = BufferedDestination::new();
        destination.set_status(StatusCode::CREATED);
        destination.set_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        destination.write_body(Bytes::from_static(b"{}")).unwrap();

        let response = destination.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_forwarding_through_mut_ref() {
        fn fill<D: Destination>(mut destination: D) {
            destination.set_status(StatusCode::ACCEPTED);
            destination.write_body(Bytes::from_static(b"ok")).unwrap();
        }

        let mut destination = BufferedDestination::new();
        fill(&mut destination);
        assert_eq!(destination.status(), StatusCode::ACCEPTED);
        assert_eq!(destination.body(), b"ok");
    }
}

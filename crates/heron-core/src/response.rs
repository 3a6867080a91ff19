//! Write-once response handle.
//!
//! Middleware and handlers share one [`ResponseHandle`] per request. The
//! first body write finalizes it; the dispatcher inspects
//! [`ResponseHandle::is_finalized`] after middleware to decide whether to
//! continue.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use serde::Serialize;

use crate::error::{ErrorBody, ErrorKind, HeronError, HeronResult};
use crate::schema::FieldError;

/// Mutable response state for a single request.
///
/// # Example
///
/// ```rust
/// use heron_core::ResponseHandle;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let mut res = ResponseHandle::new();
/// res.status(StatusCode::CREATED).json(&json!({ "foo": "bar" })).unwrap();
/// assert!(res.is_finalized());
/// assert!(res.json(&json!({})).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ResponseHandle {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    finalized: bool,
}

impl Default for ResponseHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseHandle {
    /// Creates an empty, unfinalized response with status 200.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            finalized: false,
        }
    }

    /// Sets the status code.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Sets a header, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    /// Writes a JSON body and finalizes the response.
    pub fn json<T: Serialize + ?Sized>(&mut self, body: &T) -> HeronResult<()> {
        self.ensure_open()?;
        let bytes = serde_json::to_vec(body)?;
        self.finish("application/json", Bytes::from(bytes));
        Ok(())
    }

    /// Writes a plain-text body and finalizes the response.
    pub fn text(&mut self, body: impl Into<String>) -> HeronResult<()> {
        self.ensure_open()?;
        self.finish("text/plain; charset=utf-8", Bytes::from(body.into()));
        Ok(())
    }

    /// Writes an HTML body and finalizes the response.
    pub fn html(&mut self, body: impl Into<String>) -> HeronResult<()> {
        self.ensure_open()?;
        self.finish("text/html; charset=utf-8", Bytes::from(body.into()));
        Ok(())
    }

    /// Finalizes the response without a body.
    pub fn end(&mut self) -> HeronResult<()> {
        self.ensure_open()?;
        self.finalized = true;
        Ok(())
    }

    /// Writes an error body for `kind`, overwriting any previous state.
    ///
    /// Never fails; boundaries rely on this.
    pub fn write_error(&mut self, kind: ErrorKind, errors: Option<Vec<FieldError>>) {
        let body = ErrorBody::from_kind(kind, errors);
        // ErrorBody only holds strings, serialization cannot fail
        let bytes = serde_json::to_vec(&body).unwrap_or_default();
        self.status = kind.status();
        self.finish("application/json", Bytes::from(bytes));
    }

    /// Discards status, headers, and body.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Whether a body has been written.
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Current status code.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Current headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body bytes.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body parsed as JSON, if it is JSON.
    #[must_use]
    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Converts into an `http::Response`.
    #[must_use]
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    fn ensure_open(&self) -> HeronResult<()> {
        if self.finalized {
            return Err(HeronError::ResponseAlreadySent);
        }
        Ok(())
    }

    fn finish(&mut self, content_type: &'static str, body: Bytes) {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = body;
        self.finalized = true;
    }
}

//! Parsed API requests.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{HeronError, HeronResult};

/// A request as seen by middleware, validators, and handlers.
///
/// The body and query are already parsed into JSON values so they can be
/// checked against schemas directly.
///
/// # Example
///
/// ```rust
/// use heron_core::ApiRequest;
/// use http::Method;
/// use serde_json::json;
///
/// let req = ApiRequest::new(Method::GET, "/api/todos?tag=a&tag=b&page=2".parse().unwrap());
/// assert_eq!(req.query["tag"], json!(["a", "b"]));
/// assert_eq!(req.query["page"], json!("2"));
/// assert_eq!(req.body, serde_json::Value::Null);
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Request method, exactly as received.
    pub method: Method,
    /// Request URI.
    pub uri: Uri,
    /// Request headers.
    pub headers: HeaderMap,
    /// Parsed body (`null` when empty).
    pub body: Value,
    /// Parsed query string. Repeated keys become arrays.
    pub query: Map<String, Value>,
    /// Path parameters extracted by the route manifest.
    pub params: IndexMap<String, String>,
}

impl ApiRequest {
    /// Creates a request with no headers and an empty body.
    ///
    /// The query map is parsed from the URI.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        let query = uri
            .query()
            .map(|q| parse_urlencoded(q.as_bytes()))
            .unwrap_or_default();
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Value::Null,
            query,
            params: IndexMap::new(),
        }
    }

    /// Builds a request from an `http::Request` with a collected body.
    ///
    /// Returns [`HeronError::MalformedBody`] when a JSON body does not
    /// parse or a non-JSON body is not UTF-8.
    pub fn from_http(req: http::Request<Bytes>) -> HeronResult<Self> {
        let (parts, body) = req.into_parts();
        let mut request = Self::new(parts.method, parts.uri);
        request.headers = parts.headers;
        request.body = parse_body(request.content_type().as_deref(), &body)?;
        Ok(request)
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Sets a JSON body and the matching content type.
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = body;
        self
    }

    /// Adds a header, replacing any previous value.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Media type of the body, lower-cased and stripped of parameters.
    ///
    /// `application/json; charset=utf-8` yields `application/json`.
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        let raw = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let media = raw.split(';').next().unwrap_or(raw).trim();
        Some(media.to_ascii_lowercase())
    }

    /// Value of the `user-agent` header, if it is valid text.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.headers.get(USER_AGENT)?.to_str().ok()
    }

    /// A path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

fn parse_body(content_type: Option<&str>, body: &Bytes) -> HeronResult<Value> {
    if body.is_empty() {
        return Ok(Value::Null);
    }

    match content_type {
        Some(ct) if ct == "application/json" || ct.ends_with("+json") => {
            serde_json::from_slice(body).map_err(|e| HeronError::malformed_body(e.to_string()))
        }
        Some("application/x-www-form-urlencoded") => Ok(Value::Object(parse_urlencoded(body))),
        _ => std::str::from_utf8(body)
            .map(|s| Value::String(s.to_string()))
            .map_err(|e| HeronError::malformed_body(e.to_string())),
    }
}

fn parse_urlencoded(input: &[u8]) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in form_urlencoded::parse(input) {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn http_request(content_type: Option<&str>, body: &'static str) -> http::Request<Bytes> {
        let mut builder = http::Request::builder().method(Method::POST).uri("/api/todos");
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(Bytes::from_static(body.as_bytes())).unwrap()
    }

    #[test]
    fn test_empty_body_is_null() {
        let req = ApiRequest::from_http(http_request(Some("application/json"), "")).unwrap();
        assert_eq!(req.body, Value::Null);
    }

    #[test]
    fn test_json_body() {
        let req = ApiRequest::from_http(http_request(
            Some("application/json; charset=utf-8"),
            r#"{"foo":"bar"}"#,
        ))
        .unwrap();
        assert_eq!(req.body, json!({ "foo": "bar" }));
        assert_eq!(req.content_type().as_deref(), Some("application/json"));
    }

    #[test]
    fn test_malformed_json_body() {
        let result = ApiRequest::from_http(http_request(Some("application/json"), "{nope"));
        assert!(matches!(result, Err(HeronError::MalformedBody { .. })));
    }

    #[test]
    fn test_form_body() {
        let req = ApiRequest::from_http(http_request(
            Some("application/x-www-form-urlencoded"),
            "name=milk&tag=a&tag=b",
        ))
        .unwrap();
        assert_eq!(req.body, json!({ "name": "milk", "tag": ["a", "b"] }));
    }

    #[test]
    fn test_text_body() {
        let req = ApiRequest::from_http(http_request(Some("text/plain"), "hello")).unwrap();
        assert_eq!(req.body, json!("hello"));
        let req = ApiRequest::from_http(http_request(None, "hello")).unwrap();
        assert_eq!(req.body, json!("hello"));
    }

    #[test]
    fn test_repeated_query_keys() {
        let req = ApiRequest::new(Method::GET, "/x?a=1&a=2&a=3&b=%20c".parse().unwrap());
        assert_eq!(req.query["a"], json!(["1", "2", "3"]));
        assert_eq!(req.query["b"], json!(" c"));
    }

    #[test]
    fn test_content_type_missing() {
        let req = ApiRequest::new(Method::GET, "/x".parse().unwrap());
        assert_eq!(req.content_type(), None);
        assert_eq!(req.user_agent(), None);
    }

    #[test]
    fn test_builders() {
        let req = ApiRequest::new(Method::POST, "/api/todos/7".parse().unwrap())
            .with_json(json!({ "a": 1 }))
            .with_header(USER_AGENT, HeaderValue::from_static("curl/8"))
            .with_param("id", "7");
        assert_eq!(req.content_type().as_deref(), Some("application/json"));
        assert_eq!(req.user_agent(), Some("curl/8"));
        assert_eq!(req.param("id"), Some("7"));
        assert_eq!(req.path(), "/api/todos/7");
    }
}

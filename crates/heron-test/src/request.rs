//! Test request building.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

use heron_core::INTERNAL_USER_AGENT;

use crate::error::{TestError, TestResult};

/// Builds an `http::Request<Bytes>` for a test.
///
/// Invalid headers or bodies are remembered and reported by
/// [`build`](Self::build), so the builder chain never panics halfway.
///
/// ```rust
/// use heron_test::TestRequestBuilder;
/// use http::Method;
/// use serde_json::json;
///
/// let req = TestRequestBuilder::new(Method::POST, "/api/todos")
///     .query("dry_run", "true")
///     .json(&json!({ "name": "milk" }))
///     .build()
///     .unwrap();
/// assert_eq!(req.uri(), "/api/todos?dry_run=true");
/// assert_eq!(req.headers()["content-type"], "application/json");
/// ```
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Starts a request.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// Sets a header, replacing any previous value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| TestError::InvalidHeader(format!("{}: {e}", name.as_ref())));
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| TestError::InvalidHeader(format!("{}: {e}", value.as_ref())));
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(error), _) | (_, Err(error)) => self.fail(error),
        }
        self
    }

    /// Sets the `content-type` header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the `user-agent` header.
    pub fn user_agent(self, agent: impl AsRef<str>) -> Self {
        self.header(USER_AGENT.as_str(), agent)
    }

    /// Sends the reserved introspection user agent.
    pub fn introspect(self) -> Self {
        self.user_agent(INTERNAL_USER_AGENT)
    }

    /// Appends a query parameter. Keys may repeat.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and `content-type: application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(error) => self.fail(TestError::Json(error)),
        }
        self.content_type("application/json")
    }

    /// Sets a urlencoded form body from `(key, value)` pairs.
    pub fn form<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.body = Bytes::from(encode_pairs(pairs));
        self.content_type("application/x-www-form-urlencoded")
    }

    /// Builds the request.
    pub fn build(self) -> TestResult<http::Request<Bytes>> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut uri = self.uri;
        if !self.query.is_empty() {
            uri.push(if uri.contains('?') { '&' } else { '?' });
            uri.push_str(&encode_pairs(self.query));
        }

        let mut request = http::Request::builder()
            .method(self.method)
            .uri(&uri)
            .body(self.body)
            .map_err(|e| TestError::RequestBuild(format!("{uri}: {e}")))?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }

    fn fail(&mut self, error: TestError) {
        self.error.get_or_insert(error);
    }
}

fn encode_pairs<I, K, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .into_iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k.as_ref()),
                urlencoding::encode(v.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

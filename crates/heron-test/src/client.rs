//! Test client for in-memory HTTP testing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;

use heron_core::{ApiRequest, ResponseHandle};
use heron_router::Endpoint;
use heron_server::{HttpResponse, Server};

use crate::error::TestResult;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// A function that answers a request.
pub type TestHandler =
    Arc<dyn Fn(http::Request<Bytes>) -> Pin<Box<dyn Future<Output = HttpResponse> + Send>> + Send + Sync>;

/// Sends requests to a server, a single route, or a closure without a
/// socket.
///
/// # Example
///
/// ```rust
/// use heron_core::Operation;
/// use heron_router::ApiRoute;
/// use heron_test::TestClient;
/// use http::StatusCode;
///
/// # tokio_test::block_on(async {
/// let client = TestClient::for_route(ApiRoute::new().operation(
///     "ping",
///     Operation::get().handler(|_req, res| Box::pin(async move {
///         res.text("pong")?;
///         Ok(())
///     })),
/// ));
///
/// client.get("/ping").send().await.assert_status(StatusCode::OK);
/// client
///     .post("/ping")
///     .send()
///     .await
///     .assert_status(StatusCode::METHOD_NOT_ALLOWED)
///     .assert_allow("GET");
/// # });
/// ```
#[must_use]
#[derive(Clone)]
pub struct TestClient {
    handler: TestHandler,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// A client backed by a closure.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(http::Request<Bytes>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HttpResponse> + Send + 'static,
    {
        Self {
            handler: Arc::new(
                move |req: http::Request<Bytes>| -> Pin<Box<dyn Future<Output = HttpResponse> + Send>> {
                    Box::pin(handler(req))
                },
            ),
            default_headers: Vec::new(),
        }
    }

    /// A client sending every request through [`Server::handle`].
    pub fn for_server(server: Server) -> Self {
        let server = Arc::new(server);
        Self::new(move |req| {
            let server = Arc::clone(&server);
            async move { server.handle(req).await }
        })
    }

    /// A client sending every request straight to one endpoint, whatever
    /// the path.
    ///
    /// There is no manifest, so no path parameters are extracted; RPC
    /// operations are selected by the last path segment.
    pub fn for_route(endpoint: impl Into<Endpoint>) -> Self {
        let endpoint = Arc::new(endpoint.into());
        Self::new(move |req| {
            let endpoint = Arc::clone(&endpoint);
            async move {
                let mut res = ResponseHandle::new();
                match ApiRequest::from_http(req) {
                    Ok(request) => endpoint.handle(&request, &mut res).await,
                    Err(error) => res.write_error(error.kind(), None),
                }
                res.into_http()
            }
        })
    }

    /// Adds a header to every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Starts a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a PATCH request.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a request with any method, including ones Heron rejects.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let builder = self
            .default_headers
            .iter()
            .fold(TestRequestBuilder::new(method, uri), |builder, (name, value)| {
                builder.header(name, value)
            });
        TestClientRequest {
            client: self,
            builder,
        }
    }

    async fn dispatch(&self, request: http::Request<Bytes>) -> TestResult<TestResponse> {
        let response = (self.handler)(request).await;
        TestResponse::from_http(response).await
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

/// A request being built by a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the `content-type` header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sends the reserved introspection user agent.
    pub fn introspect(mut self) -> Self {
        self.builder = self.builder.introspect();
        self
    }

    /// Appends a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.query(key, value);
        self
    }

    /// Sets a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: serde::Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request, panicking if it cannot be built or read.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(error) => panic!("test request failed: {error}"),
        }
    }

    /// Sends the request.
    pub async fn try_send(self) -> TestResult<TestResponse> {
        let request = self.builder.build()?;
        self.client.dispatch(request).await
    }
}

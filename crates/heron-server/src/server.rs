//! HTTP server implementation.
//!
//! The server binds a TCP listener, serves HTTP/1.1 connections with Hyper,
//! and routes every request in this order:
//!
//! 1. `server.docs_path` → [`DocsRoute`]
//! 2. `openapi_json_path` → the OpenAPI document
//! 3. a [`RouteManifest`] match → the bound endpoint
//! 4. anything else → `404 {"message": "Not found."}`
//!
//! [`Server::handle`] runs the same pipeline without a socket.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};

use heron_config::{ConfigCell, HeronConfig};
use heron_core::{ApiRequest, ErrorBody, ErrorKind, ResponseHandle};
use heron_router::{DocsRoute, RouteManifest, RouterResult};

use crate::error::{ServerError, ServerResult};
use crate::shutdown::{InFlight, ShutdownSignal};

/// Type alias for the HTTP response.
pub type HttpResponse = Response<Full<Bytes>>;

const BODY_TOO_LARGE: &str = "Request body too large.";
const TIMED_OUT: &str = "Request timed out.";

/// Serves a [`RouteManifest`] over HTTP.
///
/// # Example
///
/// ```rust
/// use heron_config::HeronConfig;
/// use heron_core::Operation;
/// use heron_router::{ApiRoute, RouteManifest};
/// use heron_server::Server;
/// use http::{Request, StatusCode};
/// use bytes::Bytes;
///
/// let server = Server::builder()
///     .config(HeronConfig::production())
///     .manifest(RouteManifest::new().api(
///         "/api/ping",
///         ApiRoute::new().operation(
///             "ping",
///             Operation::get().handler(|_req, res| Box::pin(async move {
///                 res.text("pong")?;
///                 Ok(())
///             })),
///         ),
///     ))
///     .build();
///
/// # tokio_test::block_on(async {
/// let req = Request::get("/api/ping").body(Bytes::new()).unwrap();
/// let res = server.handle(req).await;
/// assert_eq!(res.status(), StatusCode::OK);
/// # });
/// ```
#[derive(Debug)]
pub struct Server {
    config: Arc<ConfigCell>,
    manifest: Arc<RouteManifest>,
    docs: DocsRoute,
}

impl Server {
    /// Creates a server for `manifest`, reading configuration from `config`.
    ///
    /// Every endpoint in the manifest is switched to the configured runtime
    /// mode.
    #[must_use]
    pub fn new(config: Arc<ConfigCell>, mut manifest: RouteManifest) -> Self {
        manifest.set_mode(config.current().mode);
        let manifest = Arc::new(manifest);
        let docs = DocsRoute::new(Arc::clone(&config), Arc::clone(&manifest));
        Self {
            config,
            manifest,
            docs,
        }
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// The configuration currently in effect.
    #[must_use]
    pub fn config(&self) -> Arc<HeronConfig> {
        self.config.current()
    }

    /// The config cell, for installing a new configuration at runtime.
    #[must_use]
    pub fn config_cell(&self) -> &Arc<ConfigCell> {
        &self.config
    }

    /// The served manifest.
    #[must_use]
    pub fn manifest(&self) -> &RouteManifest {
        &self.manifest
    }

    /// The docs route.
    #[must_use]
    pub fn docs(&self) -> &DocsRoute {
        &self.docs
    }

    /// Initialises logging from the configuration, then serves until Ctrl-C
    /// or SIGTERM.
    pub async fn run(self) -> ServerResult<()> {
        let config = self.config.current();
        if let Err(error) = heron_telemetry::init_logging(&config.log_config()) {
            tracing::debug!(error = %error, "logging not initialised by the server");
        }
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Serves until `signal` completes.
    pub async fn run_until<F>(self, signal: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.run_with_shutdown(ShutdownSignal::from_future(signal)).await
    }

    /// Validates the configuration, binds `server.http_addr`, and serves
    /// until `shutdown` is triggered.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let config = self.config.current();
        config.validate()?;

        let addr: SocketAddr =
            config
                .server
                .http_addr
                .parse()
                .map_err(|e: std::net::AddrParseError| ServerError::InvalidAddress {
                    addr: config.server.http_addr.clone(),
                    reason: e.to_string(),
                })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// is triggered, then waits for open connections to finish.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> ServerResult<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, routes = self.manifest.len(), "Heron listening");

        let server = Arc::new(self);
        let in_flight = InFlight::new();
        let stop = shutdown.recv();
        tokio::pin!(stop);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let guard = in_flight.enter();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(error) = server.serve_connection(stream, shutdown).await {
                                    tracing::debug!(remote = %remote_addr, error = %error, "connection error");
                                }
                                drop(guard);
                            });
                        }
                        Err(error) => {
                            tracing::error!(error = %error, "failed to accept connection");
                        }
                    }
                }

                () = &mut stop => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let grace = request_timeout(&server.config.current());
        tokio::select! {
            () = in_flight.drained() => {
                tracing::info!("all connections closed");
            }
            () = tokio::time::sleep(grace) => {
                tracing::warn!(active = in_flight.active(), "shutdown grace period elapsed with open connections");
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&self);
            async move { Ok::<_, Infallible>(server.handle_incoming(req).await) }
        });

        let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_incoming(&self, req: Request<Incoming>) -> HttpResponse {
        let config = self.config.current();
        let (parts, body) = req.into_parts();

        let collected = tokio::time::timeout(
            request_timeout(&config),
            Limited::new(body, config.server.max_body_bytes).collect(),
        )
        .await;

        let body = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(error)) => {
                if error.downcast_ref::<LengthLimitError>().is_some() {
                    return error_response(StatusCode::PAYLOAD_TOO_LARGE, BODY_TOO_LARGE);
                }
                tracing::debug!(error = %error, "failed to read request body");
                return kind_response(ErrorKind::InvalidRequestBody);
            }
            Err(_) => {
                tracing::warn!(path = %parts.uri.path(), "request body collection timed out");
                return error_response(StatusCode::REQUEST_TIMEOUT, TIMED_OUT);
            }
        };

        self.handle(Request::from_parts(parts, body)).await
    }

    /// Handles a request with an already collected body.
    ///
    /// This is the whole request pipeline minus the socket.
    pub async fn handle(&self, req: Request<Bytes>) -> HttpResponse {
        let config = self.config.current();
        if req.body().len() > config.server.max_body_bytes {
            return error_response(StatusCode::PAYLOAD_TOO_LARGE, BODY_TOO_LARGE);
        }

        let request = match ApiRequest::from_http(req) {
            Ok(request) => request,
            Err(error) => {
                tracing::debug!(error = %error, "rejected request before routing");
                return kind_response(error.kind());
            }
        };

        let method = request.method.clone();
        let path = request.path().to_string();
        match tokio::time::timeout(request_timeout(&config), self.route(request, &config)).await {
            Ok(res) => {
                tracing::debug!(
                    method = %method,
                    path = %path,
                    status = res.status_code().as_u16(),
                    "request handled"
                );
                res.into_http()
            }
            Err(_) => {
                tracing::warn!(method = %method, path = %path, "request timed out");
                error_response(StatusCode::GATEWAY_TIMEOUT, TIMED_OUT)
            }
        }
    }

    async fn route(&self, mut req: ApiRequest, config: &HeronConfig) -> ResponseHandle {
        let mut res = ResponseHandle::new();
        let path = req.path();

        if path == config.server.docs_path {
            self.docs.handle(&req, &mut res).await;
        } else if path == config.openapi_json_path {
            if let Err(error) = self.serve_spec(config, &mut res).await {
                tracing::error!(route = %config.openapi_json_path, error = %error, "failed to serve OpenAPI document");
                res.reset();
                res.write_error(ErrorKind::Unexpected, None);
            }
        } else if let Some(matched) = self.manifest.match_path(path) {
            req.params = matched.params;
            matched.endpoint.handle(&req, &mut res).await;
        } else {
            res.write_error(ErrorKind::NotFound, None);
        }

        res
    }

    /// Development assembles the document on every request; production
    /// prefers the synced file and assembles only if it is unavailable.
    async fn serve_spec(&self, config: &HeronConfig, res: &mut ResponseHandle) -> RouterResult<()> {
        if config.mode.is_production() {
            if let Some(spec) = read_synced_spec(&config.spec_output).await {
                res.json(&spec)?;
                return Ok(());
            }
        }

        let spec = self.docs.generate_spec(config)?;
        res.json(&spec)?;
        Ok(())
    }
}

async fn read_synced_spec(path: &Path) -> Option<Value> {
    let contents = match tokio::fs::read(path).await {
        Ok(contents) => contents,
        Err(error) => {
            tracing::debug!(path = %path.display(), error = %error, "no synced OpenAPI file, assembling");
            return None;
        }
    };

    match serde_json::from_slice(&contents) {
        Ok(spec) => Some(spec),
        Err(error) => {
            tracing::warn!(path = %path.display(), error = %error, "synced OpenAPI file is not valid JSON, assembling");
            None
        }
    }
}

fn request_timeout(config: &HeronConfig) -> Duration {
    Duration::from_secs(config.server.request_timeout_secs)
}

fn kind_response(kind: ErrorKind) -> HttpResponse {
    let mut res = ResponseHandle::new();
    res.write_error(kind, None);
    res.into_http()
}

fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    let body = serde_json::to_vec(&ErrorBody::new(message)).unwrap_or_default();
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

/// Builder for [`Server`].
#[derive(Debug, Default)]
pub struct ServerBuilder {
    config: Option<Arc<ConfigCell>>,
    manifest: RouteManifest,
}

impl ServerBuilder {
    /// Creates a builder with the default configuration and no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a fixed configuration.
    #[must_use]
    pub fn config(mut self, config: HeronConfig) -> Self {
        self.config = Some(Arc::new(ConfigCell::with_config(config)));
        self
    }

    /// Shares a config cell with other components.
    #[must_use]
    pub fn config_cell(mut self, cell: Arc<ConfigCell>) -> Self {
        self.config = Some(cell);
        self
    }

    /// Sets the routes to serve.
    #[must_use]
    pub fn manifest(mut self, manifest: RouteManifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        let config = self.config.unwrap_or_default();
        Server::new(config, self.manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{Input, Operation, RuntimeMode, Schema, INTERNAL_USER_AGENT};
    use heron_router::{ApiRoute, RpcOperation, RpcRoute};
    use http::header::{ALLOW, USER_AGENT};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn todos() -> ApiRoute {
        ApiRoute::new()
            .operation(
                "getTodo",
                Operation::get().handler(|req, res| {
                    Box::pin(async move {
                        res.json(&json!({ "id": req.param("id") }))?;
                        Ok(())
                    })
                }),
            )
            .operation(
                "updateTodo",
                Operation::put()
                    .input(
                        Input::new()
                            .content_type("application/json")
                            .body(Schema::new(json!({ "type": "object" }))),
                    )
                    .handler(|req, res| {
                        Box::pin(async move {
                            res.json(&req.body)?;
                            Ok(())
                        })
                    }),
            )
    }

    fn rpc() -> RpcRoute {
        RpcRoute::new().operation(
            "ping",
            RpcOperation::default()
                .handler(|_input| Box::pin(async move { Ok(json!({ "pong": true })) })),
        )
    }

    fn server_with(config: HeronConfig) -> Server {
        Server::builder()
            .config(config)
            .manifest(
                RouteManifest::new()
                    .api("/api/todos/{id}", todos())
                    .rpc("/api/rpc", rpc()),
            )
            .build()
    }

    fn dev_config(dir: &Path) -> HeronConfig {
        HeronConfig {
            mode: RuntimeMode::Development,
            spec_output: dir.join("openapi.json"),
            suppress_info: true,
            ..HeronConfig::default()
        }
    }

    fn request(method: &str, uri: &str, body: &'static str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    async fn body_json(res: HttpResponse) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_routes_with_params() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_with(dev_config(dir.path()));

        let res = server.handle(request("GET", "/api/todos/a%20b", "")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, json!({ "id": "a b" }));
    }

    #[tokio::test]
    async fn test_rpc_route() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_with(dev_config(dir.path()));

        let res = server.handle(request("POST", "/api/rpc/ping", "{}")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, json!({ "pong": true }));
    }

    #[tokio::test]
    async fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_with(dev_config(dir.path()));

        let res = server.handle(request("GET", "/api/nothing", "")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(res).await, json!({ "message": "Not found." }));
    }

    #[tokio::test]
    async fn test_method_not_allowed_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_with(dev_config(dir.path()));

        let res = server.handle(request("DELETE", "/api/todos/1", "")).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers().get(ALLOW).unwrap(), "GET, PUT");
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_body() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_with(dev_config(dir.path()));

        let res = server.handle(request("PUT", "/api/todos/1", "{not json")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await, json!({ "message": "Invalid request body." }));
    }

    #[tokio::test]
    async fn test_body_too_large() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = dev_config(dir.path());
        config.server.max_body_bytes = 4;
        let server = server_with(config);

        let res = server.handle(request("PUT", "/api/todos/1", "{\"a\":1}")).await;
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(res).await["message"], BODY_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_openapi_json_in_development() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_with(dev_config(dir.path()));

        let res = server.handle(request("GET", "/openapi.json", "")).await;
        assert_eq!(res.status(), StatusCode::OK);
        let spec = body_json(res).await;
        assert_eq!(spec["openapi"], "3.1.0");
        assert!(spec["paths"]["/api/todos/{id}"]["get"].is_object());
        assert!(spec["paths"]["/api/rpc/ping"]["post"].is_object());
    }

    #[tokio::test]
    async fn test_openapi_json_in_production_prefers_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("openapi.json");
        std::fs::write(
            &output,
            r#"{"openapi":"3.1.0","info":{"title":"From file","version":"9"},"paths":{}}"#,
        )
        .unwrap();
        let config = HeronConfig {
            mode: RuntimeMode::Production,
            spec_output: output,
            ..HeronConfig::default()
        };
        let server = server_with(config);

        let res = server.handle(request("GET", "/openapi.json", "")).await;
        assert_eq!(body_json(res).await["info"]["title"], "From file");
    }

    #[tokio::test]
    async fn test_openapi_json_in_production_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = HeronConfig {
            mode: RuntimeMode::Production,
            spec_output: dir.path().join("missing.json"),
            ..HeronConfig::default()
        };
        let server = server_with(config);

        let res = server.handle(request("GET", "/openapi.json", "")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_json(res).await["paths"]["/api/todos/{id}"].is_object());
    }

    #[tokio::test]
    async fn test_docs_path_serves_html() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_with(dev_config(dir.path()));

        let res = server.handle(request("GET", "/api", "")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        assert!(dir.path().join("openapi.json").exists());
    }

    #[tokio::test]
    async fn test_production_config_disables_route_introspection() {
        let dir = tempfile::tempdir().unwrap();
        let config = HeronConfig {
            spec_output: dir.path().join("openapi.json"),
            ..HeronConfig::production()
        };
        let server = server_with(config);

        let mut req = request("GET", "/api/todos/1", "");
        req.headers_mut()
            .insert(USER_AGENT, INTERNAL_USER_AGENT.parse().unwrap());
        let res = server.handle(req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, json!({ "id": "1" }));

        let mut req = request("POST", "/api/rpc/ping", "{}");
        req.headers_mut()
            .insert(USER_AGENT, INTERNAL_USER_AGENT.parse().unwrap());
        let res = server.handle(req).await;
        assert_eq!(body_json(res).await, json!({ "pong": true }));
    }

    #[tokio::test]
    async fn test_development_config_enables_route_introspection() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_with(dev_config(dir.path()));

        let mut req = request("GET", "/api/todos/1", "");
        req.headers_mut()
            .insert(USER_AGENT, INTERNAL_USER_AGENT.parse().unwrap());
        let res = server.handle(req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let paths = &body_json(res).await["oasData"]["paths"];
        assert!(paths["/api/todos/1"]["get"].is_object());
    }

    #[tokio::test]
    async fn test_invalid_http_addr_is_config_error() {
        let mut config = HeronConfig::default();
        config.server.http_addr = "not an address".to_string();
        let server = Server::builder().config(config).build();

        let result = server.run_with_shutdown(ShutdownSignal::new()).await;
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn test_serves_over_tcp_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_with(dev_config(dir.path()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = ShutdownSignal::new();

        let task = tokio::spawn(server.serve(listener, shutdown.clone()));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /api/todos/7 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response.ends_with(r#"{"id":"7"}"#), "{response}");

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("server should stop")
            .unwrap()
            .unwrap();
    }
}

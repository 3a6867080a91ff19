//! RPC routes.
//!
//! An [`RpcRoute`] exposes named operations at `POST <route>/{operation}`.
//! RPC handlers work on values rather than responses: the parsed body goes
//! in, a JSON value comes out and is sent with status 200.

use std::fmt;
use std::sync::Arc;

use http::header::{HeaderValue, ALLOW};
use indexmap::IndexMap;
use serde_json::{json, Value};

use heron_core::{
    ApiRequest, BoxError, BoxFuture, ErrorKind, HeronError, HeronResult, Input,
    JsonSchemaValidator, Output, ResponseHandle, RuntimeMode, Schema, SchemaValidator,
    ValidMethod, INTERNAL_USER_AGENT,
};
use heron_docs::{rpc_fragment, rpc_operation_path, DocsResult, DocumentedRoute, Fragment};

use crate::route::decode_path;

/// Name of the path parameter carrying the operation name.
pub const RPC_OPERATION_PARAM: &str = "operation";

type RpcMiddlewareFn =
    dyn for<'a> Fn(&'a Value) -> BoxFuture<'a, Result<Option<Value>, BoxError>> + Send + Sync;
type RpcHandlerFn =
    dyn for<'a> Fn(&'a Value) -> BoxFuture<'a, Result<Value, BoxError>> + Send + Sync;

/// One named RPC operation.
///
/// # Example
///
/// ```rust
/// use heron_core::Schema;
/// use heron_router::RpcOperation;
/// use serde_json::json;
///
/// let op = RpcOperation::new()
///     .input(Schema::new(json!({ "type": "object" })))
///     .handler(|input| Box::pin(async move { Ok(json!({ "echo": input })) }));
/// ```
#[derive(Clone, Default)]
pub struct RpcOperation {
    input: Option<Input>,
    outputs: Vec<Output>,
    middleware: Option<Arc<RpcMiddlewareFn>>,
    handler: Option<Arc<RpcHandlerFn>>,
    openapi: Option<Value>,
}

impl RpcOperation {
    /// Creates an operation with no input, outputs, or handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the JSON body schema.
    #[must_use]
    pub fn input(mut self, schema: Schema) -> Self {
        self.input = Some(Input::new().content_type("application/json").body(schema));
        self
    }

    /// Adds an output description.
    #[must_use]
    pub fn output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    /// Replaces all output descriptions.
    #[must_use]
    pub fn outputs(mut self, outputs: Vec<Output>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Sets the middleware. Returning `Some(value)` answers the request
    /// with that value and skips validation and the handler.
    #[must_use]
    pub fn middleware<F>(mut self, func: F) -> Self
    where
        F: for<'a> Fn(&'a Value) -> BoxFuture<'a, Result<Option<Value>, BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.middleware = Some(Arc::new(func));
        self
    }

    /// Sets the handler.
    #[must_use]
    pub fn handler<F>(mut self, func: F) -> Self
    where
        F: for<'a> Fn(&'a Value) -> BoxFuture<'a, Result<Value, BoxError>> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(func));
        self
    }

    /// Sets an OpenAPI operation object merged over the generated one.
    #[must_use]
    pub fn openapi(mut self, operation: Value) -> Self {
        self.openapi = Some(operation);
        self
    }
}

impl fmt::Debug for RpcOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcOperation")
            .field("input", &self.input)
            .field("outputs", &self.outputs)
            .field("middleware", &self.middleware.is_some())
            .field("handler", &self.handler.is_some())
            .field("openapi", &self.openapi)
            .finish()
    }
}

/// A route of named RPC operations.
///
/// # Example
///
/// ```rust
/// use heron_core::{ApiRequest, ResponseHandle};
/// use heron_router::{RpcOperation, RpcRoute};
/// use http::Method;
/// use serde_json::json;
///
/// let route = RpcRoute::new().operation(
///     "getTodos",
///     RpcOperation::new().handler(|_input| Box::pin(async move { Ok(json!(["milk"])) })),
/// );
///
/// # tokio_test::block_on(async {
/// let req = ApiRequest::new(Method::POST, "/api/rpc/getTodos".parse().unwrap())
///     .with_param("operation", "getTodos");
/// let mut res = ResponseHandle::new();
/// route.handle(&req, &mut res).await;
/// assert_eq!(res.body_json(), Some(json!(["milk"])));
/// # });
/// ```
#[derive(Clone)]
pub struct RpcRoute {
    operations: IndexMap<String, RpcOperation>,
    validator: Arc<dyn SchemaValidator>,
    mode: RuntimeMode,
}

impl Default for RpcRoute {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcRoute {
    /// Creates an empty RPC route.
    #[must_use]
    pub fn new() -> Self {
        Self {
            operations: IndexMap::new(),
            validator: Arc::new(JsonSchemaValidator::new()),
            mode: RuntimeMode::from_env(),
        }
    }

    /// Adds a named operation.
    #[must_use]
    pub fn operation(mut self, name: impl Into<String>, operation: RpcOperation) -> Self {
        self.operations.insert(name.into(), operation);
        self
    }

    /// Replaces the schema validator.
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Sets the runtime mode. Routes served by a `heron_server::Server`
    /// take the server's configured mode instead.
    #[must_use]
    pub const fn mode(mut self, mode: RuntimeMode) -> Self {
        self.mode = mode;
        self
    }

    pub(crate) fn set_mode(&mut self, mode: RuntimeMode) {
        self.mode = mode;
    }

    /// Operation names in declaration order.
    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// Handles a request, always leaving a finalized response behind.
    ///
    /// The operation name is read from the `operation` path parameter, or
    /// from the last path segment when the parameter is absent.
    pub async fn handle(&self, req: &ApiRequest, res: &mut ResponseHandle) {
        let name = operation_name(req);
        if let Err(error) = self.dispatch(req, res, &name).await {
            tracing::error!(
                route = %req.path(),
                operation = %name,
                error = %error,
                "unexpected error while handling RPC request"
            );
            res.reset();
            res.write_error(ErrorKind::Unexpected, None);
        }
    }

    async fn dispatch(
        &self,
        req: &ApiRequest,
        res: &mut ResponseHandle,
        name: &str,
    ) -> HeronResult<()> {
        if !self.mode.is_production() && req.user_agent() == Some(INTERNAL_USER_AGENT) {
            let path = decode_path(req.path());
            let route = path
                .strip_suffix(name)
                .map_or(path.as_str(), |base| base.trim_end_matches('/'));
            let paths = self.fragment(route).map_err(|e| HeronError::SpecGeneration {
                route: route.to_string(),
                message: e.to_string(),
            })?;
            return res.json(&json!({ "oasData": { "paths": paths } }));
        }

        if ValidMethod::from_http(&req.method) != Some(ValidMethod::Post) {
            res.set_header(ALLOW, HeaderValue::from_static("POST"));
            res.write_error(ErrorKind::MethodNotAllowed, None);
            return Ok(());
        }

        let Some(operation) = self.operations.get(name) else {
            res.write_error(ErrorKind::OperationNotAllowed, None);
            return Ok(());
        };

        if let Some(middleware) = &operation.middleware {
            if let Some(value) = middleware(&req.body).await.map_err(HeronError::Middleware)? {
                tracing::debug!(operation = %name, "middleware answered the request");
                return res.json(&value);
            }
        }

        if let Some(schema) = operation.input.as_ref().and_then(|i| i.body.as_ref()) {
            let outcome = self.validator.validate(schema, &req.body)?;
            if !outcome.valid {
                res.write_error(ErrorKind::InvalidRequestBody, Some(outcome.errors));
                return Ok(());
            }
        }

        let handler = operation
            .handler
            .as_ref()
            .ok_or_else(|| HeronError::HandlerNotFound {
                operation: name.to_string(),
            })?;
        let value = handler(&req.body).await.map_err(HeronError::Handler)?;
        res.json(&value)
    }
}

impl DocumentedRoute for RpcRoute {
    fn fragment(&self, template: &str) -> DocsResult<Fragment> {
        rpc_fragment(
            template,
            self.operations.iter().map(|(name, op)| {
                (
                    name.as_str(),
                    op.input.as_ref(),
                    op.outputs.as_slice(),
                    op.openapi.as_ref(),
                )
            }),
        )
    }

    fn documented_paths(&self, template: &str) -> Vec<String> {
        self.operations
            .keys()
            .map(|name| rpc_operation_path(template, name))
            .collect()
    }
}

impl fmt::Debug for RpcRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcRoute")
            .field("operations", &self.operations)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

fn operation_name(req: &ApiRequest) -> String {
    req.param(RPC_OPERATION_PARAM).map_or_else(
        || decode_path(req.path().rsplit('/').next().unwrap_or_default()),
        str::to_string,
    )
}

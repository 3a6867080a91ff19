//! The operation dispatcher.
//!
//! An [`ApiRoute`] owns the named operations of one path template and turns
//! each request into exactly one response: method gate, introspection,
//! operation selection, middleware, media type gate, body and query
//! validation, then the handler. Every error is caught at the route boundary
//! and reported as a 500 with the generic message.

use std::sync::Arc;

use http::header::{HeaderValue, ALLOW};
use serde_json::{json, Value};

use heron_core::{
    ApiRequest, ErrorKind, HeronError, HeronResult, JsonSchemaValidator, Operation, Operations,
    ResponseHandle, RuntimeMode, SchemaValidator, ValidMethod, INTERNAL_USER_AGENT,
};
use heron_docs::{route_fragment, DocsResult, DocumentedRoute, Fragment};

/// A route made of named, per-method operations.
///
/// # Example
///
/// ```rust
/// use heron_core::{ApiRequest, Input, Operation, ResponseHandle, Schema};
/// use heron_router::ApiRoute;
/// use http::{Method, StatusCode};
/// use serde_json::json;
///
/// let route = ApiRoute::new().operation(
///     "createTodo",
///     Operation::post()
///         .input(Input::new().content_type("application/json").body(Schema::new(json!({
///             "type": "object",
///             "properties": { "name": { "type": "string" } },
///             "required": ["name"]
///         }))))
///         .handler(|req, res| Box::pin(async move {
///             res.status(StatusCode::CREATED).json(&req.body)?;
///             Ok(())
///         })),
/// );
///
/// # tokio_test::block_on(async {
/// let req = ApiRequest::new(Method::POST, "/api/todos".parse().unwrap())
///     .with_json(json!({ "name": "milk" }));
/// let mut res = ResponseHandle::new();
/// route.handle(&req, &mut res).await;
/// assert_eq!(res.status_code(), StatusCode::CREATED);
/// # });
/// ```
#[derive(Clone)]
pub struct ApiRoute {
    operations: Operations,
    validator: Arc<dyn SchemaValidator>,
    mode: RuntimeMode,
    path_item: Option<Value>,
}

impl Default for ApiRoute {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiRoute {
    /// Creates a route with no operations, the default validator, and the
    /// runtime mode read from the environment.
    #[must_use]
    pub fn new() -> Self {
        Self::from_operations(Operations::new())
    }

    /// Creates a route from an existing operation map.
    #[must_use]
    pub fn from_operations(operations: Operations) -> Self {
        Self {
            operations,
            validator: Arc::new(JsonSchemaValidator::new()),
            mode: RuntimeMode::from_env(),
            path_item: None,
        }
    }

    /// Adds a named operation. Declaration order is preserved.
    #[must_use]
    pub fn operation(mut self, name: impl Into<String>, operation: Operation) -> Self {
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

    /// Sets an OpenAPI path item merged over each generated path of this
    /// route.
    #[must_use]
    pub fn openapi_path(mut self, path_item: Value) -> Self {
        self.path_item = Some(path_item);
        self
    }

    /// The route's operations in declaration order.
    #[must_use]
    pub const fn operations(&self) -> &Operations {
        &self.operations
    }

    /// Declared methods, in declaration order and without duplicates.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<ValidMethod> {
        let mut methods = Vec::new();
        for operation in self.operations.values() {
            if !methods.contains(&operation.method()) {
                methods.push(operation.method());
            }
        }
        methods
    }

    /// Handles a request, always leaving a finalized response behind.
    pub async fn handle(&self, req: &ApiRequest, res: &mut ResponseHandle) {
        let mut operation = None;
        if let Err(error) = self.dispatch(req, res, &mut operation).await {
            tracing::error!(
                route = %req.path(),
                operation = operation.unwrap_or("-"),
                error = %error,
                "unexpected error while handling request"
            );
            res.reset();
            res.write_error(ErrorKind::Unexpected, None);
        }
    }

    async fn dispatch<'a>(
        &'a self,
        req: &ApiRequest,
        res: &mut ResponseHandle,
        selected: &mut Option<&'a str>,
    ) -> HeronResult<()> {
        let Some(method) = ValidMethod::from_http(&req.method) else {
            return self.method_not_allowed(res);
        };

        if !self.mode.is_production() && req.user_agent() == Some(INTERNAL_USER_AGENT) {
            let route = decode_path(req.path());
            let paths = route_fragment(&route, &self.operations, self.path_item.as_ref())
                .map_err(|e| HeronError::SpecGeneration {
                    route: route.clone(),
                    message: e.to_string(),
                })?;
            return res.json(&json!({ "oasData": { "paths": paths } }));
        }

        let Some((name, operation)) = self
            .operations
            .iter()
            .find(|(_, op)| op.method() == method)
        else {
            return self.method_not_allowed(res);
        };
        *selected = Some(name.as_str());

        if let Some(middleware) = operation.middleware_fn() {
            middleware
                .call(req, res)
                .await
                .map_err(HeronError::Middleware)?;
            if res.is_finalized() {
                tracing::debug!(operation = %name, "middleware finalized the response");
                return Ok(());
            }
        }

        if let Some(input) = operation.input_spec() {
            if !input.accepts(req.content_type().as_deref()) {
                res.write_error(ErrorKind::UnsupportedMediaType, None);
                return Ok(());
            }

            if let Some(schema) = &input.body {
                let outcome = self.validator.validate(schema, &req.body)?;
                if !outcome.valid {
                    res.write_error(ErrorKind::InvalidRequestBody, Some(outcome.errors));
                    return Ok(());
                }
            }

            if let Some(schema) = &input.query {
                let query = Value::Object(req.query.clone());
                let outcome = self.validator.validate(schema, &query)?;
                if !outcome.valid {
                    res.write_error(ErrorKind::InvalidQueryParameters, Some(outcome.errors));
                    return Ok(());
                }
            }
        }

        let handler = operation
            .handler_fn()
            .ok_or_else(|| HeronError::HandlerNotFound {
                operation: name.clone(),
            })?;
        handler.call(req, res).await.map_err(HeronError::Handler)
    }

    fn method_not_allowed(&self, res: &mut ResponseHandle) -> HeronResult<()> {
        let allow = ValidMethod::allow_header(self.allowed_methods());
        let value = HeaderValue::from_str(&allow)
            .map_err(|e| HeronError::invalid_header(e.to_string()))?;
        res.set_header(ALLOW, value);
        res.write_error(ErrorKind::MethodNotAllowed, None);
        Ok(())
    }
}

impl DocumentedRoute for ApiRoute {
    fn fragment(&self, template: &str) -> DocsResult<Fragment> {
        route_fragment(template, &self.operations, self.path_item.as_ref())
    }
}

impl std::fmt::Debug for ApiRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRoute")
            .field("operations", &self.operations)
            .field("mode", &self.mode)
            .field("path_item", &self.path_item)
            .finish_non_exhaustive()
    }
}

/// Percent-decodes a request path, keeping it as-is if it is not UTF-8.
pub(crate) fn decode_path(path: &str) -> String {
    urlencoding::decode(path).map_or_else(|_| path.to_string(), |p| p.into_owned())
}

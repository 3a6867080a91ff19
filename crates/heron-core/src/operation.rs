//! Declarative operation definitions.
//!
//! An [`Operation`] describes one HTTP method of a route: what it accepts
//! ([`Input`]), what it may return ([`Output`]), an optional middleware, and
//! the handler. Routes hold an ordered, named collection of operations
//! ([`Operations`]); the same definitions drive both request dispatch and
//! OpenAPI generation.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::BoxError;
use crate::method::ValidMethod;
use crate::request::ApiRequest;
use crate::response::ResponseHandle;
use crate::schema::Schema;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of a middleware or handler invocation.
pub type HandlerResult = Result<(), BoxError>;

/// Ordered, named operations of a route. Insertion order is declaration order.
pub type Operations = IndexMap<String, Operation>;

/// Request processing shared by middleware and handlers.
///
/// Implementors read the request and write to the response handle. Closures
/// are accepted through [`Operation::handler`] and [`Operation::middleware`].
///
/// # Example
///
/// ```rust
/// use heron_core::{ApiRequest, BoxFuture, Handler, HandlerResult, ResponseHandle};
///
/// struct Ping;
///
/// impl Handler for Ping {
///     fn call<'a>(
///         &'a self,
///         _req: &'a ApiRequest,
///         res: &'a mut ResponseHandle,
///     ) -> BoxFuture<'a, HandlerResult> {
///         Box::pin(async move {
///             res.text("pong")?;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Processes the request.
    fn call<'a>(
        &'a self,
        req: &'a ApiRequest,
        res: &'a mut ResponseHandle,
    ) -> BoxFuture<'a, HandlerResult>;
}

/// A function-based handler wrapper.
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F>
where
    F: for<'a> Fn(&'a ApiRequest, &'a mut ResponseHandle) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    /// Wraps a closure.
    #[must_use]
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a ApiRequest, &'a mut ResponseHandle) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        req: &'a ApiRequest,
        res: &'a mut ResponseHandle,
    ) -> BoxFuture<'a, HandlerResult> {
        (self.func)(req, res)
    }
}

/// What an operation accepts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Input {
    /// Required request media type, compared without parameters.
    pub content_type: Option<String>,
    /// Schema for the parsed body.
    pub body: Option<Schema>,
    /// Schema for the parsed query object.
    pub query: Option<Schema>,
}

impl Input {
    /// Creates an input that accepts anything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires a media type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into().to_ascii_lowercase());
        self
    }

    /// Whether a request media type satisfies the declared one.
    ///
    /// Both sides are compared case-insensitively without parameters. An
    /// input without a declared media type accepts anything, including a
    /// missing one.
    ///
    /// ```rust
    /// use heron_core::Input;
    ///
    /// let input = Input::new().content_type("Application/JSON; charset=utf-8");
    /// assert!(input.accepts(Some("application/json")));
    /// assert!(!input.accepts(Some("text/plain")));
    /// assert!(!input.accepts(None));
    /// ```
    #[must_use]
    pub fn accepts(&self, media_type: Option<&str>) -> bool {
        let Some(declared) = &self.content_type else {
            return true;
        };
        media_type.is_some_and(|actual| essence(declared).eq_ignore_ascii_case(essence(actual)))
    }

    /// Sets the body schema.
    #[must_use]
    pub fn body(mut self, schema: Schema) -> Self {
        self.body = Some(schema);
        self
    }

    /// Sets the query schema.
    #[must_use]
    pub fn query(mut self, schema: Schema) -> Self {
        self.query = Some(schema);
        self
    }
}

/// A documented response of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    /// HTTP status code.
    pub status: u16,
    /// Response media type.
    pub content_type: String,
    /// Response body schema.
    pub schema: Schema,
}

impl Output {
    /// Creates an output description.
    #[must_use]
    pub fn new(status: u16, content_type: impl Into<String>, schema: Schema) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            schema,
        }
    }
}

/// One method of a route.
///
/// Operations are immutable once the route is built and may be shared across
/// concurrent requests.
#[derive(Clone)]
pub struct Operation {
    method: ValidMethod,
    input: Option<Input>,
    outputs: Vec<Output>,
    middleware: Option<Arc<dyn Handler>>,
    handler: Option<Arc<dyn Handler>>,
    openapi: Option<Value>,
}

impl Operation {
    /// Creates an operation for a method, with no input, outputs, or handler.
    #[must_use]
    pub fn new(method: ValidMethod) -> Self {
        Self {
            method,
            input: None,
            outputs: Vec::new(),
            middleware: None,
            handler: None,
            openapi: None,
        }
    }

    /// Shorthand for `Operation::new(ValidMethod::Get)`.
    #[must_use]
    pub fn get() -> Self {
        Self::new(ValidMethod::Get)
    }

    /// Shorthand for `Operation::new(ValidMethod::Post)`.
    #[must_use]
    pub fn post() -> Self {
        Self::new(ValidMethod::Post)
    }

    /// Shorthand for `Operation::new(ValidMethod::Put)`.
    #[must_use]
    pub fn put() -> Self {
        Self::new(ValidMethod::Put)
    }

    /// Shorthand for `Operation::new(ValidMethod::Delete)`.
    #[must_use]
    pub fn delete() -> Self {
        Self::new(ValidMethod::Delete)
    }

    /// Sets the input description.
    #[must_use]
    pub fn input(mut self, input: Input) -> Self {
        self.input = Some(input);
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

    /// Sets a middleware closure, run before validation.
    #[must_use]
    pub fn middleware<F>(self, func: F) -> Self
    where
        F: for<'a> Fn(&'a ApiRequest, &'a mut ResponseHandle) -> BoxFuture<'a, HandlerResult>
            + Send
            + Sync
            + 'static,
    {
        self.middleware_with(FnHandler::new(func))
    }

    /// Sets a middleware implementation.
    #[must_use]
    pub fn middleware_with(mut self, middleware: impl Handler) -> Self {
        self.middleware = Some(Arc::new(middleware));
        self
    }

    /// Sets the handler closure.
    #[must_use]
    pub fn handler<F>(self, func: F) -> Self
    where
        F: for<'a> Fn(&'a ApiRequest, &'a mut ResponseHandle) -> BoxFuture<'a, HandlerResult>
            + Send
            + Sync
            + 'static,
    {
        self.handler_with(FnHandler::new(func))
    }

    /// Sets a handler implementation.
    #[must_use]
    pub fn handler_with(mut self, handler: impl Handler) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Sets an OpenAPI operation object merged over the generated one.
    #[must_use]
    pub fn openapi(mut self, operation: Value) -> Self {
        self.openapi = Some(operation);
        self
    }

    /// The declared method.
    #[must_use]
    pub const fn method(&self) -> ValidMethod {
        self.method
    }

    /// The input description, if any.
    #[must_use]
    pub const fn input_spec(&self) -> Option<&Input> {
        self.input.as_ref()
    }

    /// Declared outputs.
    #[must_use]
    pub fn output_specs(&self) -> &[Output] {
        &self.outputs
    }

    /// The middleware, if any.
    #[must_use]
    pub fn middleware_fn(&self) -> Option<&dyn Handler> {
        self.middleware.as_deref()
    }

    /// The handler, if any.
    #[must_use]
    pub fn handler_fn(&self) -> Option<&dyn Handler> {
        self.handler.as_deref()
    }

    /// The OpenAPI override, if any.
    #[must_use]
    pub const fn openapi_override(&self) -> Option<&Value> {
        self.openapi.as_ref()
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("method", &self.method)
            .field("input", &self.input)
            .field("outputs", &self.outputs)
            .field("middleware", &self.middleware.is_some())
            .field("handler", &self.handler.is_some())
            .field("openapi", &self.openapi)
            .finish()
    }
}

fn essence(media_type: &str) -> &str {
    media_type.split(';').next().unwrap_or(media_type).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use serde_json::json;

    fn echo() -> Operation {
        Operation::post().handler(|req, res| {
            Box::pin(async move {
                res.status(StatusCode::CREATED).json(&req.body)?;
                Ok(())
            })
        })
    }

    #[test]
    fn test_builder() {
        let op = Operation::get()
            .input(Input::new().query(Schema::new(json!({ "type": "object" }))))
            .output(Output::new(200, "application/json", Schema::new(json!({}))))
            .openapi(json!({ "summary": "List" }));

        assert_eq!(op.method(), ValidMethod::Get);
        assert!(op.input_spec().unwrap().query.is_some());
        assert_eq!(op.output_specs().len(), 1);
        assert!(op.handler_fn().is_none());
        assert!(op.middleware_fn().is_none());
        assert_eq!(op.openapi_override(), Some(&json!({ "summary": "List" })));
    }

    #[test]
    fn test_content_type_lowercased() {
        let input = Input::new().content_type("Application/JSON");
        assert_eq!(input.content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_closure_handler() {
        let op = echo();
        let req = ApiRequest::new(Method::POST, "/api/echo".parse().unwrap())
            .with_json(json!({ "foo": "bar" }));
        let mut res = ResponseHandle::new();

        op.handler_fn().unwrap().call(&req, &mut res).await.unwrap();

        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.body_json(), Some(json!({ "foo": "bar" })));
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let op = Operation::get().handler(|_req, _res| {
            Box::pin(async move { Err::<(), BoxError>("boom".into()) })
        });
        let req = ApiRequest::new(Method::GET, "/".parse().unwrap());
        let mut res = ResponseHandle::new();

        let err = op.handler_fn().unwrap().call(&req, &mut res).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_debug_hides_closures() {
        let debug = format!("{:?}", echo());
        assert!(debug.contains("handler: true"));
        assert!(debug.contains("middleware: false"));
    }
}

//! # Heron Core
//!
//! Core types for the Heron API layer.
//!
//! This crate provides the building blocks every other Heron crate uses:
//!
//! - [`ValidMethod`] - The fixed allow-list of HTTP methods an operation may declare
//! - [`ApiRequest`] - Parsed request (method, headers, body, query, path parameters)
//! - [`ResponseHandle`] - Write-once response handle shared by middleware and handlers
//! - [`Operation`] - Declarative per-method operation definition
//! - [`SchemaValidator`] - Pluggable schema validation capability
//! - [`HeronError`] - Standard error type
//!
//! ## Example
//!
//! ```rust
//! use heron_core::{Input, Operation, Output, Schema, ValidMethod};
//! use http::StatusCode;
//! use serde_json::json;
//!
//! let todo = Schema::new(json!({
//!     "type": "object",
//!     "properties": { "name": { "type": "string" } },
//!     "required": ["name"]
//! }));
//!
//! let create = Operation::new(ValidMethod::Post)
//!     .input(Input::new().content_type("application/json").body(todo.clone()))
//!     .output(Output::new(201, "application/json", todo))
//!     .handler(|req, res| {
//!         Box::pin(async move {
//!             res.status(StatusCode::CREATED).json(&req.body)?;
//!             Ok(())
//!         })
//!     });
//!
//! assert_eq!(create.method(), ValidMethod::Post);
//! ```

#![doc(html_root_url = "https://docs.rs/heron-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod method;
mod operation;
mod request;
mod response;
mod runtime;
mod schema;

pub use error::{BoxError, ErrorBody, ErrorKind, HeronError, HeronResult};
pub use method::ValidMethod;
pub use operation::{
    BoxFuture, FnHandler, Handler, HandlerResult, Input, Operation, Operations, Output,
};
pub use request::ApiRequest;
pub use response::ResponseHandle;
pub use runtime::{RuntimeMode, INTERNAL_USER_AGENT, RUNTIME_MODE_ENV};
pub use schema::{FieldError, JsonSchemaValidator, Schema, SchemaValidator, ValidationOutcome};

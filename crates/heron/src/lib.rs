//! # Heron
//!
//! Declarative routing and validation for HTTP APIs, with OpenAPI 3.1
//! generated from the same definitions.
//!
//! A route is a set of named operations, one per method. Each operation
//! declares its input (media type, body schema, query schema), its outputs,
//! an optional middleware and a handler. Heron rejects requests that do not
//! fit the declaration before the handler runs:
//!
//! | Condition                          | Response                               |
//! |------------------------------------|----------------------------------------|
//! | method not declared                | `405` with `Allow`                     |
//! | media type differs                 | `415 Invalid media type.`              |
//! | body fails its schema              | `400 Invalid request body.` + `errors` |
//! | query fails its schema             | `400 Invalid query parameters.`        |
//! | handler or middleware fails        | `500` with a generic message           |
//!
//! ## Example
//!
//! ```rust,no_run
//! use heron::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let todos = ApiRoute::new().operation(
//!         "createTodo",
//!         Operation::post()
//!             .input(Input::new().content_type("application/json").body(Schema::new(json!({
//!                 "type": "object",
//!                 "properties": { "name": { "type": "string" } },
//!                 "required": ["name"]
//!             }))))
//!             .output(Output::new(201, "application/json", Schema::new(json!({ "type": "object" }))))
//!             .handler(|req, res| Box::pin(async move {
//!                 res.status(http::StatusCode::CREATED).json(&req.body)?;
//!                 Ok(())
//!             })),
//!     );
//!
//!     let config = ConfigLoader::new()
//!         .with_optional_file("heron.toml")?
//!         .with_env_prefix("HERON")
//!         .load()?;
//!
//!     Server::builder()
//!         .config(config)
//!         .manifest(RouteManifest::new().api("/api/todos", todos))
//!         .build()
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/heron/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use heron_core as core;

// Re-export OpenAPI generation
pub use heron_docs as docs;

// Re-export configuration
pub use heron_config as config;

// Re-export logging setup
pub use heron_telemetry as telemetry;

// Re-export routing
pub use heron_router as router;

// Re-export the server
pub use heron_server as server;

/// Prelude module for convenient imports.
///
/// ```rust
/// use heron::prelude::*;
///
/// let route = ApiRoute::new().operation("ping", Operation::get());
/// assert_eq!(route.allowed_methods(), vec![ValidMethod::Get]);
/// ```
pub mod prelude {
    pub use heron_core::{
        ApiRequest, BoxError, ErrorBody, ErrorKind, FieldError, HandlerResult, HeronError,
        HeronResult, Input, JsonSchemaValidator, Operation, Output, ResponseHandle, RuntimeMode, Schema,
        SchemaValidator, ValidMethod, ValidationOutcome, INTERNAL_USER_AGENT,
    };

    pub use heron_config::{ConfigCell, ConfigLoader, HeronConfig};

    pub use heron_docs::{DocsProvider, OpenApi, PathFilter, SpecAssembler};

    pub use heron_router::{
        ApiRoute, DocsRoute, Endpoint, RouteConvention, RouteManifest, RpcOperation, RpcRoute,
    };

    pub use heron_server::{Server, ShutdownSignal};

    pub use heron_telemetry::{init_logging, LogConfig};
}

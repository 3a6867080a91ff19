//! # Heron Router
//!
//! Request dispatch for Heron.
//!
//! This crate provides:
//! - [`ApiRoute`]: per-method operations with validation and a 500 boundary
//! - [`RpcRoute`]: named operations reached by `POST <route>/{operation}`
//! - [`RouteConvention`]: file-system discovery of path templates
//! - [`RouteManifest`]: the explicit (template, endpoint) list an app serves
//! - [`DocsRoute`]: the documentation page, with spec sync in development
//!
//! ## Example
//!
//! ```rust
//! use heron_core::{Input, Operation, Schema};
//! use heron_router::{ApiRoute, RouteManifest};
//! use http::StatusCode;
//! use serde_json::json;
//!
//! let todos = ApiRoute::new()
//!     .operation(
//!         "getTodos",
//!         Operation::get().handler(|_req, res| Box::pin(async move {
//!             res.json(&json!([{ "id": 1, "name": "milk" }]))?;
//!             Ok(())
//!         })),
//!     )
//!     .operation(
//!         "createTodo",
//!         Operation::post()
//!             .input(Input::new().content_type("application/json").body(Schema::new(json!({
//!                 "type": "object",
//!                 "properties": { "name": { "type": "string" } },
//!                 "required": ["name"]
//!             }))))
//!             .handler(|req, res| Box::pin(async move {
//!                 res.status(StatusCode::CREATED).json(&req.body)?;
//!                 Ok(())
//!             })),
//!     );
//!
//! let manifest = RouteManifest::new().api("/api/todos", todos);
//! assert!(manifest.match_path("/api/todos").is_some());
//! ```

mod discovery;
mod docs_route;
mod error;
mod manifest;
mod route;
mod rpc;

pub use discovery::{DiscoveredRoute, RouteConvention};
pub use docs_route::DocsRoute;
pub use error::{RouterError, RouterResult};
pub use manifest::{Endpoint, RouteManifest, RouteMatch};
pub use route::ApiRoute;
pub use rpc::{RpcOperation, RpcRoute, RPC_OPERATION_PARAM};

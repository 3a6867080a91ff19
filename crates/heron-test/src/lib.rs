//! # Heron Test
//!
//! In-memory testing for Heron: requests go through exactly the code a
//! real connection would reach, without binding a port.
//!
//! - [`TestClient::for_server`]: the full server pipeline (docs, OpenAPI
//!   document, manifest routing, 404)
//! - [`TestClient::for_route`]: one [`ApiRoute`](heron_router::ApiRoute) or
//!   [`RpcRoute`](heron_router::RpcRoute), whatever the path
//! - [`TestClient::new`]: any closure
//!
//! ## Example
//!
//! ```rust
//! use heron_core::{Input, Operation, Schema};
//! use heron_router::ApiRoute;
//! use heron_test::TestClient;
//! use http::StatusCode;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let client = TestClient::for_route(ApiRoute::new().operation(
//!     "createTodo",
//!     Operation::post()
//!         .input(Input::new().content_type("application/json").body(Schema::new(json!({
//!             "type": "object",
//!             "properties": { "name": { "type": "string" } },
//!             "required": ["name"]
//!         }))))
//!         .handler(|req, res| Box::pin(async move {
//!             res.status(StatusCode::CREATED).json(&req.body)?;
//!             Ok(())
//!         })),
//! ));
//!
//! client
//!     .post("/api/todos")
//!     .json(&json!({ "name": "milk" }))
//!     .send()
//!     .await
//!     .assert_status(StatusCode::CREATED)
//!     .assert_json_field("name", &json!("milk"));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/heron-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest, TestHandler};
pub use error::{TestError, TestResult};
pub use request::TestRequestBuilder;
pub use response::TestResponse;

//! # Heron Docs
//!
//! OpenAPI generation for Heron.
//!
//! This crate provides:
//! - **OpenAPI types** modelling a 3.1 document
//! - **Route fragments** built from the same operation definitions the
//!   dispatcher runs
//! - **Path filtering** with `*`/`**` globs
//! - **Spec assembly** merging route fragments into a user base document
//! - **Spec file sync** keeping the generated file on disk current
//! - **Docs pages** for ReDoc and Swagger UI
//!
//! ## Quick Start
//!
//! ```rust
//! use heron_core::{Operation, Operations};
//! use heron_docs::{route_fragment, OpenApi, PathFilter};
//!
//! let mut ops = Operations::new();
//! ops.insert("getTodos".to_string(), Operation::get());
//!
//! let mut spec = OpenApi::new("Todo API", "1.0.0");
//! let filter = PathFilter::new().allow(["/api/**"]);
//!
//! if filter.is_included("/api/todos") {
//!     spec.paths.extend(route_fragment("/api/todos", &ops, None).unwrap());
//! }
//! assert!(spec.paths.contains_key("/api/todos"));
//! ```

mod assemble;
mod error;
mod filter;
mod fragment;
mod html;
mod openapi;
mod sync;

pub use assemble::{DocumentedRoute, SpecAssembler};
pub use error::{DocsError, DocsResult};
pub use filter::{glob_match, FilterOutcome, PathFilter};
pub use fragment::{document_operation, route_fragment, rpc_fragment, rpc_operation_path, Fragment};
pub use html::{DocsPage, DocsProvider};
pub use openapi::{
    extract_path_parameters, Contact, Extensions, ExternalDocumentation, Info, License, MediaType,
    OpenApi, Operation, Parameter, ParameterIn, PathItem, RequestBody, Response, Schema,
    SchemaType, SchemaTypes, Server, Tag,
};
pub use sync::{sync_spec_file, SyncOutcome};

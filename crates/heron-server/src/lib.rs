//! # Heron Server
//!
//! Hyper/Tokio HTTP server for a Heron [`RouteManifest`](heron_router::RouteManifest).
//!
//! The server serves the docs page at `server.docs_path`, the OpenAPI
//! document at `openapi_json_path`, and every manifest route, with request
//! bodies collected under a timeout and a size limit. It stops on Ctrl-C,
//! SIGTERM, or a caller-supplied future, and lets open connections finish.
//!
//! ```rust,no_run
//! use heron_config::ConfigLoader;
//! use heron_router::RouteManifest;
//! use heron_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new()
//!         .with_optional_file("heron.toml")?
//!         .with_env_prefix("HERON")
//!         .load()?;
//!
//!     Server::builder()
//!         .config(config)
//!         .manifest(RouteManifest::new())
//!         .build()
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/heron-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod server;
mod shutdown;

pub use error::{ServerError, ServerResult};
pub use server::{HttpResponse, Server, ServerBuilder};
pub use shutdown::{InFlight, InFlightGuard, ShutdownSignal};

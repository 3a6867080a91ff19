//! Typed configuration for Heron.
//!
//! This crate provides a strongly-typed configuration system with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//! - A shared [`ConfigCell`] that logs when the config is replaced
//!
//! # Example
//!
//! ```no_run
//! use heron_config::ConfigLoader;
//!
//! # fn main() -> Result<(), heron_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("heron.toml")?
//!     .with_env_prefix("HERON")
//!     .load()?;
//!
//! println!("Docs served at: {}", config.server.docs_path);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! openapi_json_path = "/openapi.json"
//! spec_output = "public/openapi.json"
//! auto_generate = true
//! allowed_paths = ["/api/**"]
//! denied_paths = ["/api/internal/**"]
//! suppress_info = false
//! mode = "development"
//!
//! [openapi.info]
//! title = "Todo API"
//! version = "1.0.0"
//!
//! [docs]
//! provider = "redoc"
//!
//! [server]
//! http_addr = "0.0.0.0:3000"
//! docs_path = "/api"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden via environment variables using the format
//! `PREFIX__SECTION__KEY`, e.g. `HERON__SERVER__HTTP_ADDR=0.0.0.0:9000` or
//! `HERON__AUTO_GENERATE=false`.

mod cell;
mod config;
mod error;
mod loader;

pub use cell::{ConfigCell, ConfigChange};
pub use config::{DocsConfig, HeronConfig, LoggingConfig, ServerConfig};
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

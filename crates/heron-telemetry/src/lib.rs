//! Structured logging for Heron.
//!
//! Heron emits `tracing` events throughout: caught handler errors at `error`,
//! configuration changes, ignored documentation paths, and spec file
//! generation at `info`. This crate installs the subscriber that renders
//! them.
//!
//! # Example
//!
//! ```rust
//! use heron_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production()).ok();
//! ```

#![doc(html_root_url = "https://docs.rs/heron-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

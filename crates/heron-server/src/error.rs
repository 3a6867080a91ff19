//! Server error types.

use heron_config::ConfigError;
use thiserror::Error;

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address does not parse.
    #[error("Invalid address '{addr}': {reason}")]
    InvalidAddress {
        /// Address as configured.
        addr: String,
        /// Parser message.
        reason: String,
    },

    /// Binding the listener failed.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        /// Address being bound.
        addr: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

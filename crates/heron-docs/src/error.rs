//! Error types for the documentation crate.
//!
//! This module defines errors that can occur while building path fragments,
//! assembling the OpenAPI document, and writing it to disk.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during documentation generation.
#[derive(Debug, Error)]
pub enum DocsError {
    /// Failed to serialize or deserialize OpenAPI JSON.
    #[error("Failed to serialize OpenAPI spec: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Schema conversion failed.
    #[error("Failed to convert schema: {reason}")]
    SchemaConversion {
        /// The reason for the conversion failure.
        reason: String,
    },

    /// An operation definition could not be documented.
    #[error("Invalid operation '{operation_id}': {reason}")]
    InvalidOperation {
        /// The operation name.
        operation_id: String,
        /// The reason the operation is invalid.
        reason: String,
    },

    /// A path item override could not be applied.
    #[error("Invalid path item override for '{path}': {reason}")]
    InvalidPathItem {
        /// The route template.
        path: String,
        /// The reason the override is invalid.
        reason: String,
    },

    /// A route's fragment could not be generated. Aborts the whole assembly.
    #[error("OpenAPI spec generation failed for route: {route}: {source}")]
    RouteGeneration {
        /// Route template.
        route: String,
        /// Underlying error.
        #[source]
        source: Box<DocsError>,
    },

    /// Reading or writing the spec file failed.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for documentation operations.
pub type DocsResult<T> = Result<T, DocsError>;

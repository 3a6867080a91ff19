//! Router error types.

use std::path::PathBuf;

use heron_core::HeronError;
use heron_docs::DocsError;
use thiserror::Error;

/// Errors from route discovery, manifest building, and the docs route.
#[derive(Error, Debug)]
pub enum RouterError {
    /// Walking the routes directory failed.
    #[error("failed to walk routes directory {}: {source}", root.display())]
    Walk {
        /// Directory being walked.
        root: PathBuf,
        /// Underlying error.
        #[source]
        source: walkdir::Error,
    },

    /// A path template is not usable.
    #[error("invalid route template `{template}`: {reason}")]
    InvalidTemplate {
        /// The template.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two templates match the same paths.
    #[error("route template `{template}` conflicts with `{existing}`")]
    ConflictingTemplate {
        /// The template being added.
        template: String,
        /// The template already registered.
        existing: String,
    },

    /// Spec generation or sync failed.
    #[error(transparent)]
    Docs(#[from] DocsError),

    /// A core operation failed.
    #[error(transparent)]
    Core(#[from] HeronError),
}

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;

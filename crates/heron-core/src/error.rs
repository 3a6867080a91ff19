//! Error types for Heron.
//!
//! Two layers of errors live here:
//!
//! - [`ErrorKind`] is the client-facing classification. Each kind maps to a
//!   fixed HTTP status and a fixed message that is written into an
//!   [`ErrorBody`].
//! - [`HeronError`] is the internal error type returned by dispatch steps.
//!   Route boundaries catch it, log it, and answer with
//!   [`ErrorKind::Unexpected`]. Its details never reach the client.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::FieldError;

/// Result type alias using [`HeronError`].
pub type HeronResult<T> = Result<T, HeronError>;

/// Boxed error returned by user middleware and handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Client-facing error classification.
///
/// # Example
///
/// ```rust
/// use heron_core::ErrorKind;
/// use http::StatusCode;
///
/// assert_eq!(ErrorKind::UnsupportedMediaType.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
/// assert_eq!(ErrorKind::UnsupportedMediaType.message(), "Invalid media type.");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Request method is not declared by the route.
    MethodNotAllowed,
    /// Request media type differs from the declared input content type.
    UnsupportedMediaType,
    /// Request body failed schema validation or could not be parsed.
    InvalidRequestBody,
    /// Query parameters failed schema validation.
    InvalidQueryParameters,
    /// The selected operation has no handler.
    HandlerNotFound,
    /// RPC operation name is not declared.
    OperationNotAllowed,
    /// No route matched the request path.
    NotFound,
    /// Anything else; details are logged, never sent.
    Unexpected,
}

impl ErrorKind {
    /// HTTP status written for this kind.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::InvalidRequestBody | Self::InvalidQueryParameters | Self::OperationNotAllowed => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::HandlerNotFound | Self::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fixed message written for this kind.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "Method not allowed.",
            Self::UnsupportedMediaType => "Invalid media type.",
            Self::InvalidRequestBody => "Invalid request body.",
            Self::InvalidQueryParameters => "Invalid query parameters.",
            Self::HandlerNotFound => "Handler not found.",
            Self::OperationNotAllowed => "Operation not allowed.",
            Self::NotFound => "Not found.",
            Self::Unexpected => "An unknown error occurred, trying again might help.",
        }
    }
}

/// JSON body of every error response.
///
/// `errors` is only present for validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub message: String,
    /// Validation errors, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ErrorBody {
    /// Creates an error body with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }

    /// Creates the body for an error kind.
    #[must_use]
    pub fn from_kind(kind: ErrorKind, errors: Option<Vec<FieldError>>) -> Self {
        Self {
            message: kind.message().to_string(),
            errors,
        }
    }
}

/// Standard error type for Heron.
#[derive(Error, Debug)]
pub enum HeronError {
    /// The selected operation declares no handler.
    #[error("Handler not found for operation `{operation}`")]
    HandlerNotFound {
        /// Name of the operation.
        operation: String,
    },

    /// A handler returned an error.
    #[error("Handler failed: {0}")]
    Handler(#[source] BoxError),

    /// A middleware returned an error.
    #[error("Middleware failed: {0}")]
    Middleware(#[source] BoxError),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A second write was attempted on a finalized response.
    #[error("Response already sent")]
    ResponseAlreadySent,

    /// A header name or value could not be parsed.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the problem.
        message: String,
    },

    /// The request body could not be parsed for its declared content type.
    #[error("Malformed request body: {message}")]
    MalformedBody {
        /// Description of the problem.
        message: String,
    },

    /// A declared schema could not be compiled.
    #[error("Invalid schema: {reason}")]
    Schema {
        /// Compiler message.
        reason: String,
    },

    /// Building the OpenAPI fragment for a route failed.
    #[error("Spec generation failed for `{route}`: {message}")]
    SpecGeneration {
        /// Route template.
        route: String,
        /// Underlying failure.
        message: String,
    },
}

impl HeronError {
    /// Creates an invalid header error.
    #[must_use]
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Creates a malformed body error.
    #[must_use]
    pub fn malformed_body(message: impl Into<String>) -> Self {
        Self::MalformedBody {
            message: message.into(),
        }
    }

    /// The client-facing kind this error is reported as.
    ///
    /// Only a malformed body is attributable to the client; everything else
    /// is reported as unexpected.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedBody { .. } => ErrorKind::InvalidRequestBody,
            _ => ErrorKind::Unexpected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_status_mapping() {
        assert_eq!(ErrorKind::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(ErrorKind::InvalidRequestBody.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::InvalidQueryParameters.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::OperationNotAllowed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::HandlerNotFound.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErrorKind::Unexpected.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_body_omits_empty_errors() {
        let body = ErrorBody::from_kind(ErrorKind::MethodNotAllowed, None);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "Method not allowed." }));
    }

    #[test]
    fn test_body_with_errors() {
        let body = ErrorBody::from_kind(
            ErrorKind::InvalidRequestBody,
            Some(vec![FieldError::new("/name", "\"name\" is a required property")]),
        );
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "Invalid request body.");
        assert_eq!(json["errors"][0]["path"], "/name");
    }

    #[test]
    fn test_error_kind_classification() {
        assert_eq!(
            HeronError::malformed_body("expected value").kind(),
            ErrorKind::InvalidRequestBody
        );
        assert_eq!(HeronError::ResponseAlreadySent.kind(), ErrorKind::Unexpected);
        let handler = HeronError::Handler("boom".into());
        assert_eq!(handler.kind(), ErrorKind::Unexpected);
        assert!(handler.to_string().contains("boom"));
    }
}

//! Schema validation.
//!
//! Operations declare [`Schema`]s for their request body and query. The
//! dispatcher checks incoming values through the [`SchemaValidator`] trait so
//! the validation engine can be swapped; [`JsonSchemaValidator`] is the
//! default, backed by the `jsonschema` crate.
//!
//! # Example
//!
//! ```rust
//! use heron_core::{JsonSchemaValidator, Schema, SchemaValidator};
//! use serde_json::json;
//!
//! let schema = Schema::new(json!({
//!     "type": "object",
//!     "properties": { "foo": { "type": "string" } },
//!     "required": ["foo"]
//! }));
//!
//! let validator = JsonSchemaValidator::new();
//! let outcome = validator.validate(&schema, &json!({ "foo": "bar" })).unwrap();
//! assert!(outcome.valid);
//!
//! let outcome = validator.validate(&schema, &json!({})).unwrap();
//! assert!(!outcome.valid);
//! assert_eq!(outcome.errors.len(), 1);
//! ```

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HeronError, HeronResult};

/// A JSON Schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(Value);

impl Schema {
    /// Wraps a JSON Schema value.
    #[must_use]
    pub const fn new(schema: Value) -> Self {
        Self(schema)
    }

    /// The underlying JSON value.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the schema, returning the JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Schema {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// JSON pointer to the offending value (empty for the root).
    pub path: String,
    /// Description of the failure.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating one value against one schema.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Whether the value conforms.
    pub valid: bool,
    /// Failures, empty when `valid`.
    pub errors: Vec<FieldError>,
}

impl ValidationOutcome {
    /// A passing outcome.
    #[must_use]
    pub const fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// Builds an outcome from a list of failures.
    #[must_use]
    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validates JSON values against schemas.
///
/// Implementations must be deterministic: the same schema and value always
/// produce the same outcome. An invalid *schema* is an error, not a failed
/// outcome.
pub trait SchemaValidator: Send + Sync {
    /// Validates `value` against `schema`.
    fn validate(&self, schema: &Schema, value: &Value) -> HeronResult<ValidationOutcome>;
}

/// Default validator backed by the `jsonschema` crate.
///
/// Compiled validators are cached by the schema's serialized text, so each
/// distinct schema is compiled once per process.
#[derive(Default)]
pub struct JsonSchemaValidator {
    cache: DashMap<String, Arc<jsonschema::Validator>>,
}

impl JsonSchemaValidator {
    /// Creates a validator with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of compiled schemas held in the cache.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn compiled(&self, schema: &Schema) -> HeronResult<Arc<jsonschema::Validator>> {
        let key = schema.as_value().to_string();
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Arc::clone(hit.value()));
        }

        let compiled = jsonschema::validator_for(schema.as_value()).map_err(|e| {
            tracing::warn!(error = %e, "failed to compile schema");
            HeronError::Schema {
                reason: e.to_string(),
            }
        })?;
        let compiled = Arc::new(compiled);
        self.cache.insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }
}

impl std::fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchemaValidator")
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, schema: &Schema, value: &Value) -> HeronResult<ValidationOutcome> {
        let compiled = self.compiled(schema)?;
        let errors = compiled
            .iter_errors(value)
            .map(|err| FieldError::new(err.instance_path.to_string(), err.to_string()))
            .collect();
        Ok(ValidationOutcome::from_errors(errors))
    }
}

//! OpenAPI specification types.
//!
//! This module provides types that represent an OpenAPI 3.1 document. The
//! types carry the fields Heron generates and keep everything else in
//! flattened `extensions` maps, so a user-supplied base document survives a
//! parse/serialize cycle unchanged.
//!
//! ## OpenAPI 3.1 Compliance
//!
//! The types in this module follow the OpenAPI 3.1 specification:
//! <https://spec.openapis.org/oas/v3.1.0>

use std::sync::OnceLock;

use heron_core::ValidMethod;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{DocsError, DocsResult};

/// Extension and unknown fields, preserved in order.
pub type Extensions = IndexMap<String, Value>;

/// OpenAPI document root object.
///
/// # Example
///
/// ```rust
/// use heron_docs::OpenApi;
///
/// let spec = OpenApi::new("Todo API", "1.0.0");
/// assert_eq!(spec.openapi, "3.1.0");
/// assert!(spec.paths.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApi {
    /// OpenAPI version.
    #[serde(default = "default_openapi_version")]
    pub openapi: String,
    /// API metadata.
    #[serde(default)]
    pub info: Info,
    /// Available servers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// API paths and operations.
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    /// Reusable components, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Value>,
    /// Tags for API grouping.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    /// External documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "externalDocs")]
    pub external_docs: Option<ExternalDocumentation>,
    /// Any other top-level fields.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl OpenApi {
    /// Creates an empty 3.1.0 document.
    #[must_use]
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            openapi: default_openapi_version(),
            info: Info {
                title: title.into(),
                version: version.into(),
                ..Info::default()
            },
            servers: Vec::new(),
            paths: IndexMap::new(),
            components: None,
            tags: Vec::new(),
            external_docs: None,
            extensions: Extensions::new(),
        }
    }

    /// Pretty JSON rendering, as written to disk.
    pub fn to_pretty_json(&self) -> DocsResult<String> {
        serde_json::to_string_pretty(self).map_err(DocsError::from)
    }
}

impl Default for OpenApi {
    fn default() -> Self {
        Self::new("API", "1.0.0")
    }
}

fn default_openapi_version() -> String {
    "3.1.0".to_string()
}

/// API metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title.
    pub title: String,
    /// API version.
    pub version: String,
    /// API description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Terms of service URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "termsOfService")]
    pub terms_of_service: Option<String>,
    /// Contact information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// License information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    /// Extension fields such as `x-logo`.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
            terms_of_service: None,
            contact: None,
            license: None,
            extensions: Extensions::new(),
        }
    }
}

/// Contact information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Contact {
    /// Contact name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// License information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// License name.
    pub name: String,
    /// License URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// SPDX identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

/// Server information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// Server URL.
    pub url: String,
    /// Server description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Server variables for URL templating.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, Value>,
}

/// API tag for grouping operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// External documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "externalDocs")]
    pub external_docs: Option<ExternalDocumentation>,
}

/// External documentation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDocumentation {
    /// URL.
    pub url: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A path item containing operations for a single path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// Summary for all operations on this path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Description for all operations on this path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// GET operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// PUT operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// POST operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// DELETE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// OPTIONS operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// HEAD operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// PATCH operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// Parameters common to all operations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Any other fields.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl PathItem {
    /// The operation for a method, if set.
    #[must_use]
    pub const fn operation(&self, method: ValidMethod) -> Option<&Operation> {
        match method {
            ValidMethod::Get => self.get.as_ref(),
            ValidMethod::Put => self.put.as_ref(),
            ValidMethod::Post => self.post.as_ref(),
            ValidMethod::Delete => self.delete.as_ref(),
            ValidMethod::Options => self.options.as_ref(),
            ValidMethod::Head => self.head.as_ref(),
            ValidMethod::Patch => self.patch.as_ref(),
        }
    }

    fn slot(&mut self, method: ValidMethod) -> &mut Option<Operation> {
        match method {
            ValidMethod::Get => &mut self.get,
            ValidMethod::Put => &mut self.put,
            ValidMethod::Post => &mut self.post,
            ValidMethod::Delete => &mut self.delete,
            ValidMethod::Options => &mut self.options,
            ValidMethod::Head => &mut self.head,
            ValidMethod::Patch => &mut self.patch,
        }
    }

    /// Sets the operation for a method unless one is already present.
    ///
    /// Returns `false` when the slot was taken.
    pub fn insert_if_absent(&mut self, method: ValidMethod, operation: Operation) -> bool {
        let slot = self.slot(method);
        if slot.is_some() {
            return false;
        }
        *slot = Some(operation);
        true
    }

    /// Merges `other` into `self`; operations already present win.
    pub fn merge_from(&mut self, other: Self) {
        let Self {
            summary,
            description,
            get,
            put,
            post,
            delete,
            options,
            head,
            patch,
            parameters,
            extensions,
        } = other;

        let incoming = [
            (ValidMethod::Get, get),
            (ValidMethod::Put, put),
            (ValidMethod::Post, post),
            (ValidMethod::Delete, delete),
            (ValidMethod::Options, options),
            (ValidMethod::Head, head),
            (ValidMethod::Patch, patch),
        ];
        for (method, operation) in incoming {
            if let Some(operation) = operation {
                self.insert_if_absent(method, operation);
            }
        }

        if self.summary.is_none() {
            self.summary = summary;
        }
        if self.description.is_none() {
            self.description = description;
        }
        if self.parameters.is_empty() {
            self.parameters = parameters;
        }
        for (key, value) in extensions {
            self.extensions.entry(key).or_insert(value);
        }
    }

    /// Methods with an operation, in allow-list order.
    pub fn methods(&self) -> impl Iterator<Item = ValidMethod> + '_ {
        ValidMethod::ALL
            .into_iter()
            .filter(|m| self.operation(*m).is_some())
    }
}

/// An API operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Unique operation identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Full description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags for grouping.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Whether deprecated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "requestBody")]
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code.
    #[serde(default)]
    pub responses: IndexMap<String, Response>,
    /// Any other fields (security, callbacks, extensions).
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterIn {
    /// Query string parameter.
    Query,
    /// URL path parameter.
    Path,
    /// HTTP header.
    Header,
    /// Cookie.
    Cookie,
}

/// An operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter location.
    #[serde(rename = "in")]
    pub location: ParameterIn,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether required.
    #[serde(default)]
    pub required: bool,
    /// Whether deprecated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Parameter schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether required.
    #[serde(default)]
    pub required: bool,
    /// Content by media type.
    pub content: IndexMap<String, MediaType>,
}

/// Media type content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    /// Example value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// Response definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Description (required).
    pub description: String,
    /// Response headers.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, Value>,
    /// Response content by media type.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

/// JSON Schema type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// String type.
    String,
    /// Number type.
    Number,
    /// Integer type.
    Integer,
    /// Boolean type.
    Boolean,
    /// Array type.
    Array,
    /// Object type.
    Object,
    /// Null type.
    Null,
}

/// The `type` keyword: one type or several.
///
/// OpenAPI 3.1 expresses nullability as a type array such as
/// `["string", "null"]`, so arrays are kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaTypes {
    /// A single type.
    Single(SchemaType),
    /// Several types; the value may be any of them.
    Multiple(Vec<SchemaType>),
}

impl SchemaTypes {
    /// Whether `ty` is one of the allowed types.
    #[must_use]
    pub fn contains(&self, ty: SchemaType) -> bool {
        match self {
            Self::Single(single) => *single == ty,
            Self::Multiple(types) => types.contains(&ty),
        }
    }
}

impl From<SchemaType> for SchemaTypes {
    fn from(ty: SchemaType) -> Self {
        Self::Single(ty)
    }
}

/// Schema object.
///
/// Keywords Heron does not model are kept in `extensions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaTypes>,
    /// Schema format (e.g., "date-time", "email").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Reference to another schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// Object properties.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    /// Required properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Array item schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Enum values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[serde(rename = "enum")]
    pub enum_values: Vec<Value>,
    /// oneOf schemas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[serde(rename = "oneOf")]
    pub one_of: Vec<Schema>,
    /// anyOf schemas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[serde(rename = "anyOf")]
    pub any_of: Vec<Schema>,
    /// allOf schemas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[serde(rename = "allOf")]
    pub all_of: Vec<Schema>,
    /// Minimum value (for numbers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    /// Maximum value (for numbers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    /// Minimum length (for strings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "minLength")]
    pub min_length: Option<u64>,
    /// Maximum length (for strings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "maxLength")]
    pub max_length: Option<u64>,
    /// Pattern regex (for strings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Example value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Unmodelled keywords.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Schema {
    /// Create a string schema.
    #[must_use]
    pub fn string() -> Self {
        Self {
            schema_type: Some(SchemaType::String.into()),
            ..Default::default()
        }
    }

    /// Create an object schema.
    #[must_use]
    pub fn object() -> Self {
        Self {
            schema_type: Some(SchemaType::Object.into()),
            ..Default::default()
        }
    }

    /// Whether `null` is one of the allowed types.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.schema_type
            .as_ref()
            .is_some_and(|types| types.contains(SchemaType::Null))
    }

    /// Translates a JSON Schema document.
    ///
    /// JSON Schema and OpenAPI 3.1 share a vocabulary, so `type` (scalar or
    /// array) and the other keywords carry over as written. Boolean schemas
    /// in positions modelled as [`Schema`] (`properties`, `items`, `oneOf`,
    /// `anyOf`, `allOf`) are expanded, `true` to `{}` and `false` to
    /// `{"not": {}}`. Unknown keywords are preserved.
    ///
    /// ```rust
    /// use heron_docs::{Schema, SchemaType, SchemaTypes};
    /// use serde_json::json;
    ///
    /// let schema = Schema::from_json_schema(&json!({ "type": "object" })).unwrap();
    /// assert_eq!(schema.schema_type, Some(SchemaTypes::Single(SchemaType::Object)));
    ///
    /// let schema = Schema::from_json_schema(&json!({ "type": ["string", "null"] })).unwrap();
    /// assert!(schema.is_nullable());
    /// ```
    pub fn from_json_schema(schema: &Value) -> DocsResult<Self> {
        let normalized = expand_boolean_schemas(schema.clone());
        serde_json::from_value(normalized).map_err(|e| DocsError::SchemaConversion {
            reason: e.to_string(),
        })
    }
}

fn expand_boolean_schemas(schema: Value) -> Value {
    let mut object = match schema {
        Value::Bool(true) => return Value::Object(Map::new()),
        Value::Bool(false) => {
            let mut not = Map::new();
            not.insert("not".to_string(), Value::Object(Map::new()));
            return Value::Object(not);
        }
        Value::Object(object) => object,
        other => return other,
    };

    if let Some(items) = object.remove("items") {
        object.insert("items".to_string(), expand_boolean_schemas(items));
    }
    if let Some(Value::Object(children)) = object.remove("properties") {
        let children = children
            .into_iter()
            .map(|(name, child)| (name, expand_boolean_schemas(child)))
            .collect();
        object.insert("properties".to_string(), Value::Object(children));
    }
    for key in ["oneOf", "anyOf", "allOf"] {
        if let Some(Value::Array(children)) = object.remove(key) {
            let children = children.into_iter().map(expand_boolean_schemas).collect();
            object.insert(key.to_string(), Value::Array(children));
        }
    }

    Value::Object(object)
}

fn path_param_regex() -> &'static Regex {
    static PARAM: OnceLock<Regex> = OnceLock::new();
    PARAM.get_or_init(|| Regex::new(r"\{([^}/]+)\}").expect("valid regex"))
}

/// Path parameters of a template like `/users/{userId}`, in order.
///
/// ```rust
/// let params = heron_docs::extract_path_parameters("/api/foo/{bar}/qux/{fred}");
/// assert_eq!(params.len(), 2);
/// assert_eq!(params[1].name, "fred");
/// ```
#[must_use]
pub fn extract_path_parameters(template: &str) -> Vec<Parameter> {
    path_param_regex()
        .captures_iter(template)
        .filter_map(|cap| cap.get(1))
        .map(|name| Parameter {
            name: name.as_str().to_string(),
            location: ParameterIn::Path,
            description: None,
            required: true,
            deprecated: false,
            schema: Some(Schema::string()),
        })
        .collect()
}

//! Per-route OpenAPI fragments.
//!
//! A fragment is the `paths` contribution of one route: one path item keyed
//! by the route template, with one OpenAPI operation per declared method.
//! Fragments are built from the same [`heron_core::Operation`] definitions
//! the dispatcher runs.

use heron_core::{Input, Operations, Output, ValidMethod};
use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::error::{DocsError, DocsResult};
use crate::openapi::{
    self, extract_path_parameters, MediaType, Parameter, ParameterIn, PathItem, RequestBody,
    Response, Schema,
};

/// Paths contribution of a single route.
pub type Fragment = IndexMap<String, PathItem>;

const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Builds the fragment for a route.
///
/// Operations are documented in declaration order; when two operations
/// declare the same method the first one is kept. `path_override` is
/// deep-merged into the generated path item last.
///
/// # Example
///
/// ```rust
/// use heron_core::{Operation, Operations};
/// use heron_docs::route_fragment;
///
/// let mut operations = Operations::new();
/// operations.insert("getTodo".to_string(), Operation::get());
///
/// let paths = route_fragment("/api/todos/{id}", &operations, None).unwrap();
/// let get = paths["/api/todos/{id}"].get.as_ref().unwrap();
/// assert_eq!(get.operation_id.as_deref(), Some("getTodo"));
/// assert_eq!(get.parameters[0].name, "id");
/// ```
pub fn route_fragment(
    template: &str,
    operations: &Operations,
    path_override: Option<&Value>,
) -> DocsResult<Fragment> {
    let mut item = PathItem::default();

    for (name, operation) in operations {
        let documented = document_operation(
            name,
            template,
            operation.input_spec(),
            operation.output_specs(),
            operation.openapi_override(),
        )?;
        if !item.insert_if_absent(operation.method(), documented) {
            tracing::debug!(
                route = %template,
                operation = %name,
                method = %operation.method(),
                "duplicate method, keeping the first operation"
            );
        }
    }

    if let Some(overrides) = path_override {
        item = apply_override(&item, overrides).map_err(|reason| DocsError::InvalidPathItem {
            path: template.to_string(),
            reason,
        })?;
    }

    Ok(IndexMap::from([(template.to_string(), item)]))
}

/// Documents a single operation.
///
/// Path parameters come from `{name}` segments of `template`, query
/// parameters from the properties of the query schema. When no 500 response
/// is declared, a generic one is added.
pub fn document_operation(
    name: &str,
    template: &str,
    input: Option<&Input>,
    outputs: &[Output],
    overrides: Option<&Value>,
) -> DocsResult<openapi::Operation> {
    let invalid = |reason: String| DocsError::InvalidOperation {
        operation_id: name.to_string(),
        reason,
    };

    let mut parameters = extract_path_parameters(template);
    let mut request_body = None;

    if let Some(input) = input {
        if let Some(query) = &input.query {
            parameters.extend(query_parameters(query.as_value())?);
        }
        if let Some(body) = &input.body {
            let content_type = input
                .content_type
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
            request_body = Some(RequestBody {
                description: None,
                required: true,
                content: IndexMap::from([(
                    content_type,
                    MediaType {
                        schema: Some(Schema::from_json_schema(body.as_value())?),
                        example: None,
                    },
                )]),
            });
        }
    }

    let mut responses: IndexMap<String, Response> = IndexMap::new();
    for output in outputs {
        let response = responses
            .entry(output.status.to_string())
            .or_insert_with(|| Response {
                description: format!("Response for status {}", output.status),
                headers: IndexMap::new(),
                content: IndexMap::new(),
            });
        response.content.insert(
            output.content_type.clone(),
            MediaType {
                schema: Some(Schema::from_json_schema(output.schema.as_value())?),
                example: None,
            },
        );
    }
    if !responses.contains_key("500") {
        responses.insert("500".to_string(), unexpected_error_response()?);
    }

    let operation = openapi::Operation {
        operation_id: Some(name.to_string()),
        parameters,
        request_body,
        responses,
        ..Default::default()
    };

    match overrides {
        Some(overrides) => apply_override(&operation, overrides).map_err(invalid),
        None => Ok(operation),
    }
}

/// Documents RPC operations, each as a `POST` on `{template}/{name}`.
pub fn rpc_fragment<'a>(
    template: &str,
    operations: impl IntoIterator<Item = (&'a str, Option<&'a Input>, &'a [Output], Option<&'a Value>)>,
) -> DocsResult<Fragment> {
    let mut paths = Fragment::new();
    for (name, input, outputs, overrides) in operations {
        let path = rpc_operation_path(template, name);
        let documented = document_operation(name, &path, input, outputs, overrides)?;
        paths
            .entry(path)
            .or_default()
            .insert_if_absent(ValidMethod::Post, documented);
    }
    Ok(paths)
}

/// The documented path of RPC operation `name` under `template`.
///
/// ```rust
/// assert_eq!(heron_docs::rpc_operation_path("/api/rpc/", "getTodos"), "/api/rpc/getTodos");
/// ```
#[must_use]
pub fn rpc_operation_path(template: &str, name: &str) -> String {
    format!("{}/{name}", template.trim_end_matches('/'))
}

fn query_parameters(schema: &Value) -> DocsResult<Vec<Parameter>> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(Vec::new());
    };

    properties
        .iter()
        .map(|(name, property)| {
            let schema = Schema::from_json_schema(property)?;
            Ok(Parameter {
                name: name.clone(),
                location: ParameterIn::Query,
                description: schema.description.clone(),
                required: required.contains(&name.as_str()),
                deprecated: false,
                schema: Some(schema),
            })
        })
        .collect()
}

fn unexpected_error_response() -> DocsResult<Response> {
    let schema = Schema::from_json_schema(&json!({
        "type": "object",
        "properties": { "message": { "type": "string" } },
        "required": ["message"]
    }))?;
    Ok(Response {
        description: "An unknown error occurred, trying again might help.".to_string(),
        headers: IndexMap::new(),
        content: IndexMap::from([(
            DEFAULT_CONTENT_TYPE.to_string(),
            MediaType {
                schema: Some(schema),
                example: None,
            },
        )]),
    })
}

/// Deep-merges `overrides` into the JSON form of `target`.
fn apply_override<T>(target: &T, overrides: &Value) -> Result<T, String>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    if !overrides.is_object() {
        return Err("override must be a JSON object".to_string());
    }
    let mut merged = serde_json::to_value(target).map_err(|e| e.to_string())?;
    deep_merge(&mut merged, overrides);
    serde_json::from_value(merged).map_err(|e| e.to_string())
}

/// Recursively merges objects; any other value in `patch` replaces the target.
pub(crate) fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{Operation, Schema as JsonSchema};

    fn todo_schema() -> JsonSchema {
        JsonSchema::new(json!({
            "type": "object",
            "properties": { "name": { "type": "string" } },
            "required": ["name"]
        }))
    }

    fn operations() -> Operations {
        let mut ops = Operations::new();
        ops.insert(
            "getTodos".to_string(),
            Operation::get()
                .input(Input::new().query(JsonSchema::new(json!({
                    "type": "object",
                    "properties": {
                        "page": { "type": "string", "description": "Page number" },
                        "tag": { "type": "string" }
                    },
                    "required": ["page"]
                }))))
                .output(Output::new(200, "application/json", todo_schema())),
        );
        ops.insert(
            "createTodo".to_string(),
            Operation::post()
                .input(Input::new().content_type("application/json").body(todo_schema()))
                .output(Output::new(201, "application/json", todo_schema()))
                .output(Output::new(201, "text/plain", JsonSchema::new(json!({ "type": "string" })))),
        );
        ops
    }

    #[test]
    fn test_fragment_structure() {
        let paths = route_fragment("/api/todos", &operations(), None).unwrap();
        let item = &paths["/api/todos"];

        let get = item.get.as_ref().unwrap();
        assert_eq!(get.operation_id.as_deref(), Some("getTodos"));
        assert_eq!(get.parameters.len(), 2);
        assert_eq!(get.parameters[0].name, "page");
        assert!(get.parameters[0].required);
        assert_eq!(get.parameters[0].description.as_deref(), Some("Page number"));
        assert!(!get.parameters[1].required);
        assert!(get.responses.contains_key("200"));
        assert!(get.responses.contains_key("500"));

        let post = item.post.as_ref().unwrap();
        let body = post.request_body.as_ref().unwrap();
        assert!(body.content.contains_key("application/json"));
        let created = &post.responses["201"];
        assert_eq!(created.content.len(), 2);
        assert_eq!(created.description, "Response for status 201");
    }

    #[test]
    fn test_schema_types_survive_into_fragment() {
        let paths = route_fragment("/api/todos", &operations(), None).unwrap();
        let doc = serde_json::to_value(&paths).unwrap();
        let post = &doc["/api/todos"]["post"];

        let body = &post["requestBody"]["content"]["application/json"]["schema"];
        assert_eq!(body["type"], "object");
        assert_eq!(body["properties"]["name"]["type"], "string");

        assert_eq!(post["responses"]["201"]["content"]["text/plain"]["schema"]["type"], "string");
        let unexpected = &post["responses"]["500"]["content"]["application/json"]["schema"];
        assert_eq!(unexpected["type"], "object");
        assert_eq!(unexpected["properties"]["message"]["type"], "string");

        let page = &doc["/api/todos"]["get"]["parameters"][0];
        assert_eq!(page["schema"]["type"], "string");
    }

    #[test]
    fn test_path_parameters_precede_query() {
        let mut ops = Operations::new();
        ops.insert(
            "getTodo".to_string(),
            Operation::get().input(Input::new().query(JsonSchema::new(json!({
                "type": "object",
                "properties": { "expand": { "type": "string" } }
            })))),
        );
        let paths = route_fragment("/api/todos/{id}", &ops, None).unwrap();
        let get = paths["/api/todos/{id}"].get.as_ref().unwrap();
        assert_eq!(get.parameters[0].name, "id");
        assert_eq!(get.parameters[0].location, ParameterIn::Path);
        assert_eq!(get.parameters[1].location, ParameterIn::Query);
    }

    #[test]
    fn test_declared_500_is_kept() {
        let mut ops = Operations::new();
        ops.insert(
            "boom".to_string(),
            Operation::get().output(Output::new(500, "text/plain", JsonSchema::new(json!({ "type": "string" })))),
        );
        let paths = route_fragment("/api/boom", &ops, None).unwrap();
        let get = paths["/api/boom"].get.as_ref().unwrap();
        assert!(get.responses["500"].content.contains_key("text/plain"));
        assert!(!get.responses["500"].content.contains_key("application/json"));
    }

    #[test]
    fn test_operation_override_deep_merged() {
        let mut ops = Operations::new();
        ops.insert(
            "getTodos".to_string(),
            Operation::get()
                .output(Output::new(200, "application/json", todo_schema()))
                .openapi(json!({
                    "summary": "List todos",
                    "tags": ["todos"],
                    "responses": { "200": { "description": "All todos" } }
                })),
        );
        let paths = route_fragment("/api/todos", &ops, None).unwrap();
        let get = paths["/api/todos"].get.as_ref().unwrap();
        assert_eq!(get.summary.as_deref(), Some("List todos"));
        assert_eq!(get.tags, vec!["todos"]);
        assert_eq!(get.responses["200"].description, "All todos");
        assert!(get.responses["200"].content.contains_key("application/json"));
    }

    #[test]
    fn test_invalid_override_fails() {
        let mut ops = Operations::new();
        ops.insert("bad".to_string(), Operation::get().openapi(json!("nope")));
        let err = route_fragment("/api/bad", &ops, None).unwrap_err();
        assert!(matches!(err, DocsError::InvalidOperation { ref operation_id, .. } if operation_id == "bad"));

        let mut ops = Operations::new();
        ops.insert("bad".to_string(), Operation::get().openapi(json!({ "responses": 3 })));
        assert!(route_fragment("/api/bad", &ops, None).is_err());
    }

    #[test]
    fn test_path_override() {
        let paths = route_fragment(
            "/api/todos",
            &operations(),
            Some(&json!({ "summary": "Todos", "x-internal": true })),
        )
        .unwrap();
        let item = &paths["/api/todos"];
        assert_eq!(item.summary.as_deref(), Some("Todos"));
        assert_eq!(item.extensions["x-internal"], json!(true));
        assert!(item.get.is_some());
    }

    #[test]
    fn test_first_duplicate_method_wins() {
        let mut ops = Operations::new();
        ops.insert("first".to_string(), Operation::get());
        ops.insert("second".to_string(), Operation::get());
        let paths = route_fragment("/api/x", &ops, None).unwrap();
        let get = paths["/api/x"].get.as_ref().unwrap();
        assert_eq!(get.operation_id.as_deref(), Some("first"));
    }

    #[test]
    fn test_rpc_fragment() {
        let input = Input::new().body(todo_schema());
        let paths = rpc_fragment(
            "/api/rpc/",
            [
                ("createTodo", Some(&input), &[][..], None),
                ("listTodos", None, &[][..], None),
            ],
        )
        .unwrap();
        assert_eq!(
            paths.keys().collect::<Vec<_>>(),
            vec!["/api/rpc/createTodo", "/api/rpc/listTodos"]
        );
        let post = paths["/api/rpc/createTodo"].post.as_ref().unwrap();
        assert!(post.request_body.is_some());
    }

    #[test]
    fn test_deep_merge() {
        let mut target = json!({ "a": { "b": 1, "c": 2 }, "d": [1] });
        deep_merge(&mut target, &json!({ "a": { "c": 3 }, "d": [2], "e": null }));
        assert_eq!(target, json!({ "a": { "b": 1, "c": 3 }, "d": [2], "e": null }));
    }
}

//! A small todo API served by Heron.
//!
//! ```text
//! cargo run -p heron --example todos
//! curl -X POST localhost:3000/api/todos -H 'content-type: application/json' -d '{"name":"milk"}'
//! open http://localhost:3000/api
//! ```
//!
//! Settings come from an optional `heron.toml` and `HERON__*` variables,
//! e.g. `HERON__SERVER__HTTP_ADDR=127.0.0.1:8080`.

use std::sync::Arc;

use anyhow::Context;
use heron::prelude::*;
use http::StatusCode;
use parking_lot::RwLock;
use serde_json::{json, Value};

#[derive(Default)]
struct Store {
    todos: RwLock<Vec<Value>>,
}

impl Store {
    fn list(&self) -> Vec<Value> {
        self.todos.read().clone()
    }

    fn create(&self, name: &str) -> Value {
        let mut todos = self.todos.write();
        let todo = json!({ "id": todos.len() + 1, "name": name, "completed": false });
        todos.push(todo.clone());
        todo
    }

    fn find(&self, id: &str) -> Option<Value> {
        self.todos
            .read()
            .iter()
            .find(|todo| todo["id"].to_string() == id)
            .cloned()
    }
}

fn todo_schema() -> Schema {
    Schema::new(json!({
        "type": "object",
        "properties": {
            "id": { "type": "integer" },
            "name": { "type": "string" },
            "completed": { "type": "boolean" }
        },
        "required": ["id", "name", "completed"]
    }))
}

fn new_todo_schema() -> Schema {
    Schema::new(json!({
        "type": "object",
        "properties": { "name": { "type": "string", "minLength": 1 } },
        "required": ["name"],
        "additionalProperties": false
    }))
}

fn todos_route(store: &Arc<Store>) -> ApiRoute {
    let list = Arc::clone(store);
    let create = Arc::clone(store);

    ApiRoute::new()
        .operation(
            "getTodos",
            Operation::get()
                .output(Output::new(
                    200,
                    "application/json",
                    Schema::new(json!({ "type": "array", "items": todo_schema().into_value() })),
                ))
                .handler(move |_req, res| {
                    let todos = list.list();
                    Box::pin(async move {
                        res.json(&todos)?;
                        Ok(())
                    })
                }),
        )
        .operation(
            "createTodo",
            Operation::post()
                .input(Input::new().content_type("application/json").body(new_todo_schema()))
                .output(Output::new(201, "application/json", todo_schema()))
                .handler(move |req, res| {
                    let store = Arc::clone(&create);
                    Box::pin(async move {
                        let name = req.body["name"].as_str().unwrap_or_default();
                        res.status(StatusCode::CREATED).json(&store.create(name))?;
                        Ok(())
                    })
                }),
        )
}

fn todo_route(store: &Arc<Store>) -> ApiRoute {
    let store = Arc::clone(store);

    ApiRoute::new().operation(
        "getTodoById",
        Operation::get()
            .output(Output::new(200, "application/json", todo_schema()))
            .handler(move |req, res| {
                let todo = req.param("id").and_then(|id| store.find(id));
                Box::pin(async move {
                    match todo {
                        Some(todo) => res.json(&todo)?,
                        None => res
                            .status(StatusCode::NOT_FOUND)
                            .json(&ErrorBody::new("Todo not found."))?,
                    }
                    Ok(())
                })
            }),
    )
}

fn rpc_route(store: &Arc<Store>) -> RpcRoute {
    let list = Arc::clone(store);
    let create = Arc::clone(store);

    RpcRoute::new()
        .operation(
            "getTodos",
            RpcOperation::default().handler(move |_input| {
                let todos = list.list();
                Box::pin(async move { Ok(Value::Array(todos)) })
            }),
        )
        .operation(
            "createTodo",
            RpcOperation::default()
                .input(new_todo_schema())
                .output(Output::new(200, "application/json", todo_schema()))
                .handler(move |input| {
                    let store = Arc::clone(&create);
                    Box::pin(async move {
                        let name = input["name"].as_str().unwrap_or_default();
                        Ok(store.create(name))
                    })
                }),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_optional_file("heron.toml")
        .context("reading heron.toml")?
        .with_env_prefix("HERON")
        .load()
        .context("loading configuration")?;

    let store = Arc::new(Store::default());
    let manifest = RouteManifest::new()
        .api("/api/todos", todos_route(&store))
        .api("/api/todos/{id}", todo_route(&store))
        .rpc("/api/rpc", rpc_route(&store));

    Server::builder()
        .config(config)
        .manifest(manifest)
        .build()
        .run()
        .await
        .context("serving")?;
    Ok(())
}

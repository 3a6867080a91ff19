//! End-to-end tests: routes, manifest, server and docs working together.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use heron::prelude::*;
use heron_test::TestClient;
use http::StatusCode;
use serde_json::json;

fn todo_schema() -> Schema {
    Schema::new(json!({
        "type": "object",
        "properties": { "foo": { "type": "string" } },
        "required": ["foo"],
        "additionalProperties": false
    }))
}

fn post_only() -> ApiRoute {
    ApiRoute::new().mode(RuntimeMode::Development).operation(
        "createFoo",
        Operation::post()
            .input(Input::new().content_type("application/json").body(todo_schema()))
            .output(Output::new(201, "application/json", todo_schema()))
            .handler(|_req, res| {
                Box::pin(async move {
                    res.status(StatusCode::CREATED).json(&json!({ "foo": "bar" }))?;
                    Ok(())
                })
            }),
    )
}

fn config_in(dir: &std::path::Path) -> HeronConfig {
    HeronConfig {
        mode: RuntimeMode::Development,
        spec_output: dir.join("public/openapi.json"),
        suppress_info: true,
        ..HeronConfig::default()
    }
}

#[tokio::test]
async fn test_post_only_route() {
    let client = TestClient::for_route(post_only());

    client
        .get("/api/foo")
        .send()
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED)
        .assert_allow("POST")
        .assert_message("Method not allowed.");

    let invalid = json!({ "foo": 1 });
    let res = client.post("/api/foo").json(&invalid).send().await;
    res.assert_status(StatusCode::BAD_REQUEST)
        .assert_message("Invalid request body.");
    let expected = JsonSchemaValidator::new()
        .validate(&todo_schema(), &invalid)
        .unwrap()
        .errors;
    assert!(!expected.is_empty());
    assert_eq!(res.field_errors().unwrap(), expected);

    client
        .post("/api/foo")
        .json(&json!({ "foo": "baz" }))
        .send()
        .await
        .assert_status(StatusCode::CREATED)
        .assert_json_eq(&json!({ "foo": "bar" }));
}

#[tokio::test]
async fn test_allow_lists_declared_methods_in_order() {
    let route = ApiRoute::new()
        .mode(RuntimeMode::Production)
        .operation("update", Operation::put())
        .operation("read", Operation::get())
        .operation("remove", Operation::delete());
    let client = TestClient::for_route(route);

    client
        .request(http::Method::PATCH, "/api/todos")
        .send()
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED)
        .assert_allow("PUT, GET, DELETE");

    // Methods outside the allow-list are rejected the same way.
    client
        .request(http::Method::TRACE, "/api/todos")
        .send()
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED)
        .assert_allow("PUT, GET, DELETE");
}

#[tokio::test]
async fn test_media_type_mismatch() {
    let client = TestClient::for_route(post_only());

    client
        .post("/api/foo")
        .content_type("text/plain")
        .body("foo=bar")
        .send()
        .await
        .assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE)
        .assert_message("Invalid media type.");

    client
        .post("/api/foo")
        .content_type("application/json; charset=utf-8")
        .body(r#"{"foo":"x"}"#)
        .send()
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_invalid_query_parameters() {
    let route = ApiRoute::new().mode(RuntimeMode::Production).operation(
        "list",
        Operation::get()
            .input(Input::new().query(Schema::new(json!({
                "type": "object",
                "properties": { "page": { "type": "string", "pattern": "^[0-9]+$" } },
                "required": ["page"]
            }))))
            .handler(|req, res| {
                Box::pin(async move {
                    res.json(&json!({ "page": req.query["page"] }))?;
                    Ok(())
                })
            }),
    );
    let client = TestClient::for_route(route);

    client
        .get("/api/todos")
        .send()
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_message("Invalid query parameters.");

    client
        .get("/api/todos")
        .query("page", "2")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_eq(&json!({ "page": "2" }));
}

#[tokio::test]
async fn test_middleware_short_circuit_skips_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let route = ApiRoute::new().mode(RuntimeMode::Production).operation(
        "guarded",
        Operation::get()
            .middleware(|_req, res| {
                Box::pin(async move {
                    res.status(StatusCode::UNAUTHORIZED)
                        .json(&json!({ "message": "Unauthorized." }))?;
                    Ok(())
                })
            })
            .handler(move |_req, res| {
                counter.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move {
                    res.end()?;
                    Ok(())
                })
            }),
    );
    let client = TestClient::for_route(route);

    for _ in 0..3 {
        client
            .get("/api/guarded")
            .send()
            .await
            .assert_status(StatusCode::UNAUTHORIZED)
            .assert_message("Unauthorized.");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_handler_error_is_generic_500() {
    let route = ApiRoute::new().mode(RuntimeMode::Production).operation(
        "explode",
        Operation::get().handler(|_req, _res| {
            Box::pin(async move { Err::<(), BoxError>("database is on fire".into()) })
        }),
    );
    let res = TestClient::for_route(route).get("/api/explode").send().await;

    res.assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_message(ErrorKind::Unexpected.message());
    assert!(!res.text().unwrap().contains("fire"));
}

#[tokio::test]
async fn test_introspection_returns_fragment() {
    let client = TestClient::for_route(post_only());

    let res = client.get("/api/foo").introspect().send().await;
    res.assert_status(StatusCode::OK);
    let body = res.json_value().unwrap();
    let operation = &body["oasData"]["paths"]["/api/foo"]["post"];
    assert_eq!(operation["operationId"], "createFoo");
    assert!(operation["responses"]["201"].is_object());
}

#[tokio::test]
async fn test_server_routes_manifest_and_docs() {
    let dir = tempfile::tempdir().unwrap();
    let config = HeronConfig {
        denied_paths: vec!["/api/internal/**".to_string()],
        ..config_in(dir.path())
    };
    let output = config.spec_output.clone();

    let manifest = RouteManifest::new()
        .api("/api/foo", post_only())
        .api(
            "/api/todos/{id}",
            ApiRoute::new().mode(RuntimeMode::Development).operation(
                "getTodo",
                Operation::get().handler(|req, res| {
                    Box::pin(async move {
                        res.json(&json!({ "id": req.param("id") }))?;
                        Ok(())
                    })
                }),
            ),
        )
        .api(
            "/api/internal/health",
            ApiRoute::new().operation("health", Operation::get()),
        )
        .rpc(
            "/api/rpc",
            RpcRoute::new().mode(RuntimeMode::Development).operation(
                "getTodos",
                RpcOperation::default()
                    .handler(|_input| Box::pin(async move { Ok(json!([{ "id": 1 }])) })),
            ),
        );

    let client = TestClient::for_server(Server::builder().config(config).manifest(manifest).build());

    client
        .get("/api/todos/42")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_eq(&json!({ "id": "42" }));

    client
        .post("/api/rpc/getTodos")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_eq(&json!([{ "id": 1 }]));

    client
        .get("/api/unknown")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_message("Not found.");

    client
        .get("/api")
        .introspect()
        .send()
        .await
        .assert_status(StatusCode::FORBIDDEN);

    client
        .get("/api")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_content_type("text/html")
        .assert_body_contains("/openapi.json");

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert!(written["paths"]["/api/foo"]["post"].is_object());
    assert!(written["paths"]["/api/todos/{id}"]["get"].is_object());
    assert!(written["paths"]["/api/rpc/getTodos"]["post"].is_object());
    assert!(written["paths"].get("/api/internal/health").is_none());

    let served = client.get("/openapi.json").send().await;
    served.assert_status(StatusCode::OK);
    assert_eq!(served.json_value().unwrap(), written);
}

#[tokio::test]
async fn test_spec_file_only_rewritten_on_change() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let output = config.spec_output.clone();
    let cell = Arc::new(ConfigCell::with_config(config.clone()));
    let manifest = Arc::new(RouteManifest::new().api("/api/foo", post_only()));
    let docs = DocsRoute::new(Arc::clone(&cell), manifest);

    assert_eq!(
        docs.sync_spec(&config).await.unwrap(),
        heron::docs::SyncOutcome::Created
    );
    assert_eq!(
        docs.sync_spec(&config).await.unwrap(),
        heron::docs::SyncOutcome::Unchanged
    );

    let mut retitled = config.clone();
    retitled.openapi.info.title = "Renamed".to_string();
    assert_eq!(
        cell.install(retitled.clone()),
        heron::config::ConfigChange::Replaced
    );
    assert_eq!(
        docs.sync_spec(&retitled).await.unwrap(),
        heron::docs::SyncOutcome::Updated
    );
    assert!(std::fs::read_to_string(output).unwrap().contains("Renamed"));
}

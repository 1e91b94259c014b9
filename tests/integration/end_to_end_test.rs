//! End-to-end tests over real HTTP
//!
//! Chains run through `ReqwestTransport` against a local wiremock server.

use super::{init_test_env, users_project};
use rest_chain::chain::{ChainExecutor, ChainOptions};
use rest_chain::executor::{ExecutionConfig, ReqwestTransport};
use rest_chain::models::HttpMethod;
use rest_chain::plugins::{Plugin, PluginRegistry};
use rest_chain::variables::VariableMap;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn live_executor() -> ChainExecutor {
    let transport = ReqwestTransport::new(&ExecutionConfig::new(5)).unwrap();
    ChainExecutor::new(Arc::new(transport)).with_env(HashMap::new())
}

#[tokio::test]
async fn test_create_and_fetch_over_http() {
    init_test_env();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("X-Client", "rest-chain-tests"))
        .and(body_json(json!({ "name": "Alice", "role": "member" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 123, "name": "Alice" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 123, "name": "Alice", "role": "member" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = users_project(&server.uri());
    let result = live_executor()
        .execute_chain(
            "createAndFetch",
            &config.chains["createAndFetch"],
            &config,
            &VariableMap::new(),
            &VariableMap::new(),
            ChainOptions::default(),
        )
        .await;

    assert!(result.success, "chain failed: {:?}", result.error);
    assert_eq!(result.steps.len(), 2);
    assert_eq!(result.steps[0].response.status, 201);
    assert_eq!(result.steps[0].response.status_text, "Created");
    assert_eq!(result.steps[1].request.url, format!("{}/users/123", server.uri()));

    let output: serde_json::Value = serde_json::from_str(result.default_output().unwrap()).unwrap();
    assert_eq!(output["role"], json!("member"));
}

#[tokio::test]
async fn test_server_error_stops_chain() {
    init_test_env();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = users_project(&server.uri());
    let result = live_executor()
        .execute_chain(
            "createAndFetch",
            &config.chains["createAndFetch"],
            &config,
            &VariableMap::new(),
            &VariableMap::new(),
            ChainOptions::default(),
        )
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("HTTP 500 Internal Server Error"));
    assert_eq!(result.steps.len(), 1);
    assert_eq!(result.steps[0].response.body, "boom");
}

#[tokio::test]
async fn test_execute_endpoint_with_hooks() {
    init_test_env();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("limit", "20"))
        .and(query_param("page", "3"))
        .and(header("X-Signed", "yes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&server)
        .await;

    let mut plugins = PluginRegistry::new();
    plugins.register(
        Plugin::new("signer")
            .with_pre_request_hook_fn(|mut request| {
                request.add_header("X-Signed", "yes");
                Ok(request)
            })
            .with_post_response_hook_fn(|_request, mut response| {
                response.add_header("x-hooked", "true");
                Ok(response)
            }),
    );

    let config = users_project(&server.uri());
    let cli: VariableMap = [("page".to_string(), json!(3))].into();
    let (request, response) = live_executor()
        .with_plugins(plugins)
        .execute_endpoint("users", "list", &config, &cli, &VariableMap::new(), ChainOptions::default())
        .await
        .unwrap();

    assert_eq!(request.method, HttpMethod::GET);
    assert_eq!(request.headers.get("X-Signed").map(String::as_str), Some("yes"));
    assert_eq!(response.status, 200);
    assert_eq!(response.headers.get("x-hooked").map(String::as_str), Some("true"));
    assert_eq!(response.body, r#"[{"id":1}]"#);
}

//! Chain execution integration tests
//!
//! These tests drive whole chains through a recording transport double and
//! check step threading, fail-fast behavior and dry runs.

use super::{init_test_env, json_response, users_project, RecordingTransport};
use rest_chain::chain::{ChainExecutor, ChainOptions, HttpErrorPolicy};
use rest_chain::config::{ChainDefinition, ChainStep, StepOverrides};
use rest_chain::models::HttpMethod;
use rest_chain::variables::VariableMap;
use serde_json::{json, Value};
use std::collections::HashMap;

fn executor(transport: std::sync::Arc<RecordingTransport>) -> ChainExecutor {
    ChainExecutor::new(transport).with_env(HashMap::new())
}

#[tokio::test]
async fn test_create_then_fetch_created_user() {
    init_test_env();
    let config = users_project("https://api.example.com");
    let transport = RecordingTransport::new(vec![
        json_response(201, "Created", json!({ "id": 123, "name": "Alice" })),
        json_response(200, "OK", json!({ "id": 123, "name": "Alice", "role": "member" })),
    ]);

    let result = executor(transport.clone())
        .execute_chain(
            "createAndFetch",
            &config.chains["createAndFetch"],
            &config,
            &VariableMap::new(),
            &VariableMap::new(),
            ChainOptions {
                verbose: true,
                dry_run: false,
            },
        )
        .await;

    assert!(result.success, "chain failed: {:?}", result.error);
    assert_eq!(result.chain_name, "createAndFetch");
    assert_eq!(result.steps.len(), 2);
    assert!(result.steps.iter().all(|s| s.success));

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);

    // createUser: chain vars beat globals, structured body is JSON
    assert_eq!(calls[0].method, HttpMethod::POST);
    assert_eq!(calls[0].url, "https://api.example.com/users");
    let body: Value = serde_json::from_str(calls[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({ "name": "Alice", "role": "member" }));
    assert_eq!(calls[0].content_type(), Some("application/json"));
    assert_eq!(
        calls[0].headers.get("X-Client").map(String::as_str),
        Some("rest-chain-tests")
    );

    // getCreatedUser: id threaded from the first response
    assert_eq!(calls[1].method, HttpMethod::GET);
    assert!(calls[1].url.contains("123"));
    assert_eq!(calls[1].url, "https://api.example.com/users/123");

    assert_eq!(
        result.default_output(),
        Some(r#"{"id":123,"name":"Alice","role":"member"}"#)
    );

    let full = result.to_full_json();
    assert_eq!(full["steps"][0]["stepId"], json!("createUser"));
    assert_eq!(full["steps"][1]["response"]["body"]["role"], json!("member"));
}

#[tokio::test]
async fn test_cli_and_profile_layers() {
    init_test_env();
    let config = users_project("https://api.example.com");
    let transport = RecordingTransport::new(vec![json_response(200, "OK", json!([]))]);
    let chain = ChainDefinition {
        steps: vec![ChainStep::new("create", "users.create")],
        ..Default::default()
    };

    let runner = executor(transport.clone());
    let profiles = runner
        .resolver()
        .merge_profiles(&config.profile_names_or_default(&["dev".to_string()]), &config.profiles, false);
    let result = runner
        .execute_chain("adhoc", &chain, &config, &VariableMap::new(), &profiles, ChainOptions::default())
        .await;
    assert!(result.success);
    assert!(transport.calls()[0].body.as_deref().unwrap().contains("dev-user"));

    let transport = RecordingTransport::new(vec![json_response(200, "OK", json!([]))]);
    let cli: VariableMap = [("name".to_string(), json!("from-cli"))].into();
    let result = executor(transport.clone())
        .execute_chain("adhoc", &chain, &config, &cli, &profiles, ChainOptions::default())
        .await;
    assert!(result.success);
    assert!(transport.calls()[0].body.as_deref().unwrap().contains("from-cli"));
}

#[tokio::test]
async fn test_missing_endpoint_halts_chain() {
    init_test_env();
    let config = users_project("https://api.example.com");
    let transport = RecordingTransport::new(vec![
        json_response(200, "OK", json!([])),
        json_response(200, "OK", json!([])),
    ]);

    let result = executor(transport.clone())
        .execute_chain(
            "brokenEndpoint",
            &config.chains["brokenEndpoint"],
            &config,
            &VariableMap::new(),
            &VariableMap::new(),
            ChainOptions::default(),
        )
        .await;

    assert!(!result.success);
    let error = result.error.as_deref().unwrap();
    assert!(error.contains("archive"), "unexpected error: {}", error);
    assert_eq!(error, "Endpoint 'archive' not found in API 'users'");

    // Only the first step ran; nothing after the broken one.
    assert_eq!(result.steps.len(), 1);
    assert_eq!(result.steps[0].step_id, "first");
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn test_404_halts_chain_and_records_failing_step() {
    init_test_env();
    let config = users_project("https://api.example.com");
    let transport = RecordingTransport::new(vec![
        json_response(404, "Not Found", json!({ "error": "no such user" })),
        json_response(200, "OK", json!({})),
    ]);

    let result = executor(transport.clone())
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
    assert!(result.error.as_deref().unwrap().contains("404"));
    assert_eq!(result.error.as_deref(), Some("HTTP 404 Not Found"));
    assert_eq!(result.steps.len(), 1);
    assert!(!result.steps[0].success);
    assert_eq!(result.steps[0].error.as_deref(), Some("HTTP 404 Not Found"));
    assert_eq!(transport.calls().len(), 1);
    assert_eq!(result.default_output(), None);

    assert!(HttpErrorPolicy::parse("4xx").unwrap().matches_result(&result));
    assert!(!HttpErrorPolicy::parse("5xx").unwrap().matches_result(&result));
    assert_eq!(result.exit_code(), 1);
}

#[tokio::test]
async fn test_dry_run_never_calls_transport() {
    init_test_env();
    let config = users_project("https://api.example.com");
    let transport = RecordingTransport::new(vec![]);

    let result = executor(transport.clone())
        .execute_chain(
            "createAndFetch",
            &config.chains["createAndFetch"],
            &config,
            &VariableMap::new(),
            &VariableMap::new(),
            ChainOptions {
                verbose: true,
                dry_run: true,
            },
        )
        .await;

    assert!(transport.calls().is_empty());

    // The stand-in body has no `id`, so the second step resolves against it
    // and fails on the path lookup before it is recorded.
    assert_eq!(result.steps.len(), 1);
    assert_eq!(result.steps[0].response.status_text, "OK (DRY RUN)");
    assert!(!result.success);
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .contains("JSONPath '$.body.id' found no matches"));
}

#[tokio::test]
async fn test_dry_run_records_every_step() {
    init_test_env();
    let config = users_project("https://api.example.com");
    let transport = RecordingTransport::new(vec![]);
    let chain = ChainDefinition {
        steps: (0..3)
            .map(|i| ChainStep::new(format!("list{}", i), "users.list"))
            .collect(),
        ..Default::default()
    };

    let result = executor(transport.clone())
        .execute_chain(
            "lists",
            &chain,
            &config,
            &VariableMap::new(),
            &VariableMap::new(),
            ChainOptions {
                verbose: false,
                dry_run: true,
            },
        )
        .await;

    assert!(result.success);
    assert!(transport.calls().is_empty());
    assert_eq!(result.steps.len(), 3);
    for step in &result.steps {
        assert_eq!(step.response.status, 200);
        assert_eq!(step.response.status_text, "OK (DRY RUN)");
        assert!(step.response.body.contains("dryRun"));
    }
}

#[tokio::test]
async fn test_optional_fields_are_omitted() {
    init_test_env();
    let config = users_project("https://api.example.com");
    let transport = RecordingTransport::new(vec![
        json_response(200, "OK", json!([])),
        json_response(200, "OK", json!([])),
    ]);
    let chain = ChainDefinition {
        steps: vec![
            ChainStep::new("plain", "users.list"),
            ChainStep::new("paged", "users.list").with_overrides(StepOverrides {
                headers: [("X-Page-Key".to_string(), json!("{{cursor?}}"))].into(),
                params: [("page".to_string(), json!("{{nextPage}}"))].into(),
                ..Default::default()
            }),
        ],
        vars: [
            ("cursor".to_string(), json!("abc")),
            ("nextPage".to_string(), json!(2)),
        ]
        .into(),
        ..Default::default()
    };

    let result = executor(transport.clone())
        .execute_chain("paging", &chain, &config, &VariableMap::new(), &VariableMap::new(), ChainOptions::default())
        .await;
    assert!(result.success, "{:?}", result.error);

    let calls = transport.calls();
    // Undefined optional header and param are dropped; siblings stay.
    assert!(!calls[0].headers.contains_key("X-Page-Key"));
    assert_eq!(calls[0].headers.get("Accept").map(String::as_str), Some("application/json"));
    assert_eq!(calls[0].url, "https://api.example.com/users?limit=20");

    assert_eq!(calls[1].headers.get("X-Page-Key").map(String::as_str), Some("abc"));
    assert_eq!(calls[1].url, "https://api.example.com/users?limit=20&page=2");
}

#[tokio::test]
async fn test_unresolved_variable_halts_before_sending() {
    init_test_env();
    let mut config = users_project("https://api.example.com");
    config
        .apis
        .get_mut("users")
        .unwrap()
        .headers
        .insert("Authorization".to_string(), json!("Bearer {{secret.API_TOKEN}}"));
    let transport = RecordingTransport::new(vec![json_response(200, "OK", json!([]))]);

    let result = executor(transport.clone())
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
    assert_eq!(
        result.error.as_deref(),
        Some("Step 'createUser' failed: Secret variable 'API_TOKEN' is not defined")
    );
    assert!(result.steps.is_empty());
    assert!(transport.calls().is_empty());
}

//! Integration tests module for REST Chain
//!
//! Shared fixtures for the resolution and chain integration tests.

pub mod chain_test;
pub mod end_to_end_test;
pub mod resolution_test;

use rest_chain::config::{load_config, ProjectConfig};
use rest_chain::executor::{HttpTransport, RequestError};
use rest_chain::models::{HttpRequest, HttpResponse};
use serde_json::json;
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

/// Initialize test environment (run once)
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Transport double that records every request and replies from a script.
pub struct RecordingTransport {
    responses: Mutex<Vec<HttpResponse>>,
    calls: Mutex<Vec<HttpRequest>>,
}

impl RecordingTransport {
    pub fn new(responses: Vec<HttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().rev().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HttpTransport for RecordingTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, RequestError> {
        self.calls.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| RequestError::Network("connection refused".to_string()))
    }
}

pub fn json_response(status: u16, status_text: &str, body: serde_json::Value) -> HttpResponse {
    let mut response = HttpResponse::new(status, status_text);
    response.add_header("content-type", "application/json");
    response.set_body(body.to_string());
    response
}

/// A users API with create/get/list endpoints and a few chains over it.
pub fn users_project(base_url: &str) -> ProjectConfig {
    load_config(json!({
        "apis": {
            "users": {
                "baseUrl": base_url,
                "headers": {
                    "Accept": "application/json",
                    "X-Page-Key": "{{pageKey?}}",
                    "X-Client": "{{client}}"
                },
                "variables": { "client": "rest-chain-tests" },
                "endpoints": {
                    "create": {
                        "method": "POST",
                        "path": "/users",
                        "body": { "name": "{{name}}", "role": "member" }
                    },
                    "get": { "method": "GET", "path": "/users/{userId}" },
                    "list": {
                        "method": "GET",
                        "path": "/users",
                        "params": { "page": "{{page?}}", "limit": 20 }
                    }
                }
            }
        },
        "profiles": {
            "dev": { "name": "dev-user" }
        },
        "variables": { "name": "global-user" },
        "chains": {
            "createAndFetch": {
                "description": "Create a user and read it back",
                "vars": { "name": "Alice" },
                "steps": [
                    { "id": "createUser", "call": "users.create" },
                    {
                        "id": "getCreatedUser",
                        "call": "users.get",
                        "with": { "pathParams": { "userId": "{{steps.createUser.response.body.id}}" } }
                    }
                ]
            },
            "brokenEndpoint": {
                "steps": [
                    { "id": "first", "call": "users.list" },
                    { "id": "second", "call": "users.archive" },
                    { "id": "third", "call": "users.list" }
                ]
            }
        }
    }))
    .unwrap()
}

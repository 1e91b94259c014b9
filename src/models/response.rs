//! HTTP response data models.
//!
//! This module defines the response returned by the transport (or synthesized
//! in dry-run mode): status information, headers and the raw body text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Status text used for responses synthesized in dry-run mode.
pub const DRY_RUN_STATUS_TEXT: &str = "OK (DRY RUN)";

/// Body used for responses synthesized in dry-run mode.
pub const DRY_RUN_BODY: &str = r#"{"dryRun":true,"message":"This is a dry run response"}"#;

/// Represents an HTTP response received from a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    /// HTTP status code (e.g., 200, 404, 500).
    pub status: u16,

    /// HTTP status text (e.g., "OK", "Not Found").
    pub status_text: String,

    /// Response headers as key-value pairs.
    pub headers: BTreeMap<String, String>,

    /// Raw response body text.
    pub body: String,

    /// Wall-clock time spent executing the request. Zero for dry runs.
    #[serde(skip)]
    pub duration: Duration,
}

impl HttpResponse {
    /// Creates a new HttpResponse with the given status code and text.
    pub fn new(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers: BTreeMap::new(),
            body: String::new(),
            duration: Duration::ZERO,
        }
    }

    /// The stand-in response recorded for every step of a dry run.
    pub fn dry_run() -> Self {
        let mut response = Self::new(200, DRY_RUN_STATUS_TEXT);
        response.add_header("content-type", "application/json");
        response.set_body(DRY_RUN_BODY);
        response
    }

    /// Adds a header to the response.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Sets the response body.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }
}

//! Native HTTP transport backed by reqwest.

use super::{validate_url, ExecutionConfig, HttpTransport, RequestError};
use crate::models::{HttpMethod, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Instant;

/// Sends requests with a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a client honoring the configured timeout.
    pub fn new(config: &ExecutionConfig) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout_duration())
            .build()
            .map_err(|e| RequestError::Build(e.to_string()))?;
        Ok(Self { client })
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::GET => reqwest::Method::GET,
        HttpMethod::POST => reqwest::Method::POST,
        HttpMethod::PUT => reqwest::Method::PUT,
        HttpMethod::DELETE => reqwest::Method::DELETE,
        HttpMethod::PATCH => reqwest::Method::PATCH,
        HttpMethod::HEAD => reqwest::Method::HEAD,
        HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, RequestError> {
        validate_url(&request.url)?;
        let start_time = Instant::now();

        let mut req_builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);

        for (name, value) in &request.headers {
            req_builder = req_builder.header(name, value);
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.clone());
        }

        log::debug!("Sending {} {}", request.method, request.url);
        let response = req_builder.send().await?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("Unknown").to_string();

        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(name.as_str().to_string(), value_str.to_string());
            }
        }

        let body = response.text().await?;

        let mut http_response = HttpResponse::new(status.as_u16(), status_text);
        http_response.headers = headers;
        http_response.body = body;
        http_response.duration = start_time.elapsed();

        log::debug!(
            "Received {} {} in {:?}",
            http_response.status,
            http_response.status_text,
            http_response.duration
        );

        Ok(http_response)
    }
}

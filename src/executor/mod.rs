//! HTTP transport boundary.
//!
//! The chain engine only talks to an [`HttpTransport`]. [`ReqwestTransport`]
//! is the production implementation; tests substitute their own.

pub mod config;
pub mod error;
pub mod native;

pub use config::ExecutionConfig;
pub use error::RequestError;
pub use native::ReqwestTransport;

use crate::models::{HttpRequest, HttpResponse};
use async_trait::async_trait;

/// Sends a fully resolved request and returns the raw response.
///
/// Error statuses are responses, not errors; `Err` means no response was
/// received (DNS failure, refused connection, timeout).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, RequestError>;
}

/// Checks that `url` parses and uses http or https.
pub fn validate_url(url: &str) -> Result<(), RequestError> {
    let parsed = url::Url::parse(url)?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(RequestError::UnsupportedProtocol(format!(
            "Only HTTP and HTTPS are supported, got: {}",
            scheme
        )));
    }

    Ok(())
}

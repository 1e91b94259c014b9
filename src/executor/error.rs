//! HTTP transport error types.
//!
//! This module defines the errors a transport can surface while sending a
//! request: network failures, timeouts and protocol issues.

use thiserror::Error;

/// Errors that can occur during HTTP request execution.
///
/// A response with an error status is not a `RequestError`; these only cover
/// requests that produced no response at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Connection failures, DNS resolution errors and other network-level issues.
    #[error("Network error: {0}")]
    Network(String),

    /// The request took longer than the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Certificate validation errors, handshake failures and other TLS issues.
    #[error("TLS/SSL error: {0}")]
    Tls(String),

    /// Invalid headers or a malformed response.
    #[error("HTTP protocol error: {0}")]
    Protocol(String),

    /// The HTTP client or request could not be constructed.
    #[error("Request build error: {0}")]
    Build(String),

    /// Only HTTP and HTTPS are supported.
    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),
}

/// Maps reqwest's error kinds onto [`RequestError`].
impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            RequestError::Timeout
        } else if err.is_builder() {
            RequestError::Build(message)
        } else if message.contains("certificate") || message.contains("TLS") || message.contains("SSL") {
            RequestError::Tls(message)
        } else if err.is_decode() || err.is_body() {
            RequestError::Protocol(message)
        } else {
            RequestError::Network(message)
        }
    }
}

impl From<url::ParseError> for RequestError {
    fn from(err: url::ParseError) -> Self {
        RequestError::InvalidUrl(err.to_string())
    }
}

//! Data models for HTTP requests and responses.
//!
//! These are the resolved values that flow between the chain engine, plugin
//! hooks and the HTTP transport, and that end up in a step's history.

pub mod request;
pub mod response;

pub use request::{HttpMethod, HttpRequest};
pub use response::HttpResponse;

//! Step back-references: `{{steps.ID.request...}}` and `{{steps.ID.response...}}`.
//!
//! A recorded step is exposed as two JSON objects:
//!
//! ```text
//! request:  { "method", "url", "headers", "body" }
//! response: { "status", "statusText", "headers", "body" }
//! ```
//!
//! `body` is parsed as JSON when it is valid JSON text, otherwise it stays a
//! string. The optional path is then applied with dotted/bracket syntax, e.g.
//! `body.items[0].id` or `body.items.0.id`.

use super::scope::StepDataKind;
use crate::chain::StepExecutionResult;
use crate::models::{HttpRequest, HttpResponse};
use serde_json::{json, Value as JsonValue};

/// Builds the JSON view of one half of a recorded step.
pub fn step_data(step: &StepExecutionResult, kind: StepDataKind) -> JsonValue {
    match kind {
        StepDataKind::Request => request_data(&step.request),
        StepDataKind::Response => response_data(&step.response),
    }
}

fn request_data(request: &HttpRequest) -> JsonValue {
    json!({
        "method": request.method.as_str(),
        "url": request.url,
        "headers": request.headers,
        "body": request.body.as_deref().map(parse_body).unwrap_or(JsonValue::Null),
    })
}

fn response_data(response: &HttpResponse) -> JsonValue {
    json!({
        "status": response.status,
        "statusText": response.status_text,
        "headers": response.headers,
        "body": parse_body(&response.body),
    })
}

/// Parses body text as JSON, falling back to the raw string.
pub fn parse_body(body: &str) -> JsonValue {
    serde_json::from_str(body).unwrap_or_else(|_| JsonValue::String(body.to_string()))
}

/// Represents a segment in a dotted/bracket path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    /// Object field access (e.g., "user", "name"); a numeric field also
    /// indexes into arrays.
    Field(String),

    /// Array index access (e.g., [0], [5])
    ArrayIndex(usize),
}

/// Evaluates a dotted/bracket path against a JSON value.
///
/// Returns `None` when any segment selects nothing.
pub fn evaluate_path<'a>(json: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let path = path.trim();
    let path = path.strip_prefix('$').unwrap_or(path);
    let path = path.strip_prefix('.').unwrap_or(path);

    let mut current = json;
    for segment in parse_path_segments(path) {
        current = match (&segment, current) {
            (PathSegment::Field(name), JsonValue::Object(map)) => map.get(name)?,
            (PathSegment::Field(name), JsonValue::Array(items)) => {
                items.get(name.parse::<usize>().ok()?)?
            }
            (PathSegment::ArrayIndex(index), JsonValue::Array(items)) => items.get(*index)?,
            (PathSegment::ArrayIndex(index), JsonValue::Object(map)) => {
                map.get(&index.to_string())?
            }
            _ => return None,
        };
    }

    Some(current)
}

/// Parses a path into segments.
///
/// - "user.name" -> [Field("user"), Field("name")]
/// - "items[0].id" -> [Field("items"), ArrayIndex(0), Field("id")]
/// - "headers['content-type']" -> [Field("headers"), Field("content-type")]
fn parse_path_segments(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '.' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Field(std::mem::take(&mut current)));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Field(std::mem::take(&mut current)));
                }

                let mut inner = String::new();
                for next_ch in chars.by_ref() {
                    if next_ch == ']' {
                        break;
                    }
                    inner.push(next_ch);
                }

                let inner = inner.trim();
                match inner.parse::<usize>() {
                    Ok(index) => segments.push(PathSegment::ArrayIndex(index)),
                    Err(_) => {
                        let key = inner.trim_matches(|c| c == '\'' || c == '"');
                        segments.push(PathSegment::Field(key.to_string()));
                    }
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(PathSegment::Field(current));
    }

    segments
}

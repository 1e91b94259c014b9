//! Builds the concrete [`HttpRequest`] for an endpoint call.
//!
//! Layers, lowest to highest: API defaults, endpoint definition, step
//! overrides (`with`). Headers and query parameters merge key by key; bodies
//! merge deeply, object into object.

use crate::config::{ApiDefinition, EndpointDefinition, StepOverrides};
use crate::models::{HttpMethod, HttpRequest};
use crate::variables::{stringify, VarError, VariableContext, VariableResolver};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// `{name}` placeholders in endpoint paths, filled from `with.pathParams`.
static PATH_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_.\-]*)\}").expect("Failed to compile path placeholder regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Variable(#[from] VarError),

    #[error("Invalid HTTP method '{0}'")]
    InvalidMethod(String),
}

/// Resolves method, URL, headers, query parameters and body of a call.
///
/// Header and parameter values referencing an undefined optional variable
/// (`{{name?}}`) are left out, as are values that are `null`.
pub async fn build_request(
    resolver: &VariableResolver,
    api: &ApiDefinition,
    endpoint: &EndpointDefinition,
    with: Option<&StepOverrides>,
    ctx: &VariableContext,
) -> Result<HttpRequest, BuildError> {
    let method_text = resolver.resolve(&endpoint.method, ctx).await?;
    let method =
        HttpMethod::parse(&method_text).ok_or_else(|| BuildError::InvalidMethod(method_text.clone()))?;

    let url = build_url(resolver, api, endpoint, with, ctx).await?;
    let mut request = HttpRequest::new(method, url);

    let empty = HashMap::new();
    let with_headers = with.map_or(&empty, |w| &w.headers);
    for (name, value) in merge_headers([&api.headers, &endpoint.headers, with_headers]) {
        if let Some(value) = resolve_field_value(resolver, value, ctx).await? {
            request.add_header(name, value);
        }
    }

    let body = merged_body(endpoint.body.as_ref(), with.and_then(|w| w.body.as_ref()));
    if let Some(body) = body {
        match resolver.resolve_value(&body, ctx).await? {
            Value::Null => {}
            Value::String(text) => request.set_body(text),
            structured => {
                if request.content_type().is_none() {
                    request.add_header("Content-Type", "application/json");
                }
                request.set_body(structured.to_string());
            }
        }
    }

    Ok(request)
}

async fn build_url(
    resolver: &VariableResolver,
    api: &ApiDefinition,
    endpoint: &EndpointDefinition,
    with: Option<&StepOverrides>,
    ctx: &VariableContext,
) -> Result<String, VarError> {
    let base_url = resolver.resolve(&api.base_url, ctx).await?;
    let mut path = resolver.resolve(&endpoint.path, ctx).await?;

    if let Some(path_params) = with.map(|w| &w.path_params).filter(|p| !p.is_empty()) {
        let mut resolved = HashMap::with_capacity(path_params.len());
        for (name, value) in path_params {
            let value = resolver.resolve_value(value, ctx).await?;
            resolved.insert(name.as_str(), stringify(&value));
        }
        path = fill_path_placeholders(&path, &resolved);
    }

    let mut url = join_url(&base_url, &path);

    let empty = HashMap::new();
    let with_params = with.map_or(&empty, |w| &w.params);
    let mut merged: BTreeMap<&str, &Value> = BTreeMap::new();
    for layer in [&api.params, &endpoint.params, with_params] {
        merged.extend(layer.iter().map(|(name, value)| (name.as_str(), value)));
    }

    // Only the winning value of each parameter is resolved.
    let mut query: BTreeMap<&str, String> = BTreeMap::new();
    for (name, value) in merged {
        if let Some(value) = resolve_field_value(resolver, value, ctx).await? {
            query.insert(name, value);
        }
    }

    if !query.is_empty() {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query.iter())
            .finish();
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&encoded);
    }

    Ok(url)
}

/// Resolves a header or parameter value; `None` means leave the field out.
async fn resolve_field_value(
    resolver: &VariableResolver,
    value: &Value,
    ctx: &VariableContext,
) -> Result<Option<String>, VarError> {
    match value {
        Value::Null => Ok(None),
        Value::String(template) => resolver.resolve_field(template, ctx).await,
        other => {
            let resolved = resolver.resolve_value(other, ctx).await?;
            Ok(Some(stringify(&resolved)))
        }
    }
}

/// Later layers win; header names compare case-insensitively.
fn merge_headers<'a>(layers: [&'a HashMap<String, Value>; 3]) -> Vec<(&'a str, &'a Value)> {
    let mut merged: Vec<(&str, &Value)> = Vec::new();
    for layer in layers {
        let mut names: Vec<&String> = layer.keys().collect();
        names.sort();
        for name in names {
            merged.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            merged.push((name.as_str(), &layer[name]));
        }
    }
    merged
}

fn fill_path_placeholders(path: &str, params: &HashMap<&str, String>) -> String {
    PATH_PLACEHOLDER
        .replace_all(path, |caps: &regex::Captures| match params.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.is_empty() {
        return base_url.to_string();
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// `override_body` wins; two objects merge key by key, recursively.
fn merged_body(base: Option<&Value>, override_body: Option<&Value>) -> Option<Value> {
    match (base, override_body) {
        (None, None) => None,
        (Some(base), None) => Some(base.clone()),
        (None, Some(over)) => Some(over.clone()),
        (Some(base), Some(over)) => Some(deep_merge(base, over)),
    }
}

fn deep_merge(base: &Value, over: &Value) -> Value {
    match (base, over) {
        (Value::Object(base_map), Value::Object(over_map)) => {
            let mut merged = base_map.clone();
            for (key, over_value) in over_map {
                let value = match merged.get(key) {
                    Some(base_value) => deep_merge(base_value, over_value),
                    None => over_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }
        _ => over.clone(),
    }
}

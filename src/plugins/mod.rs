//! Plugin host boundary.
//!
//! Plugins are supplied by the caller already loaded. Each [`Plugin`] can
//! contribute:
//!
//! - named variable sources, reachable as `{{plugins.NAME.VAR}}`
//! - parameterized sources, reachable as `{{plugins.NAME.FUNC(a, b)}}`
//! - pre-request hooks, run on every resolved request before it is sent
//! - post-response hooks, run on every response before it is recorded
//!
//! Sources and hooks are async so they can fetch from the network. Hooks run
//! in registration order, plugin by plugin; the first failing hook aborts the
//! operation with the plugin's name attached.
//!
//! # Example
//!
//! ```
//! use rest_chain::plugins::{Plugin, PluginRegistry};
//! use serde_json::json;
//!
//! let plugin = Plugin::new("auth")
//!     .with_variable_fn("token", || Ok(json!("abc")))
//!     .with_function_fn("scoped", |args: &[String]| Ok(json!(format!("tok-{}", args.join("-")))));
//!
//! let mut registry = PluginRegistry::new();
//! registry.register(plugin);
//! assert_eq!(registry.names(), vec!["auth"]);
//! ```

mod registry;

pub use registry::{HookError, HookStage, PluginRegistry};

use crate::models::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Error returned by a plugin source or hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PluginError {
    pub message: String,
}

impl PluginError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A zero-argument variable source.
#[async_trait]
pub trait VariableSource: Send + Sync {
    async fn get(&self) -> Result<Value, PluginError>;
}

/// A variable source taking already-resolved string arguments.
#[async_trait]
pub trait ParameterizedSource: Send + Sync {
    async fn call(&self, args: &[String]) -> Result<Value, PluginError>;
}

/// Runs on the fully resolved request before it is sent (or echoed in a dry run).
#[async_trait]
pub trait PreRequestHook: Send + Sync {
    async fn before_request(&self, request: HttpRequest) -> Result<HttpRequest, PluginError>;
}

/// Runs on every response received from the transport.
#[async_trait]
pub trait PostResponseHook: Send + Sync {
    async fn after_response(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
    ) -> Result<HttpResponse, PluginError>;
}

#[async_trait]
impl<F> VariableSource for F
where
    F: Fn() -> Result<Value, PluginError> + Send + Sync,
{
    async fn get(&self) -> Result<Value, PluginError> {
        self()
    }
}

#[async_trait]
impl<F> ParameterizedSource for F
where
    F: Fn(&[String]) -> Result<Value, PluginError> + Send + Sync,
{
    async fn call(&self, args: &[String]) -> Result<Value, PluginError> {
        self(args)
    }
}

#[async_trait]
impl<F> PreRequestHook for F
where
    F: Fn(HttpRequest) -> Result<HttpRequest, PluginError> + Send + Sync,
{
    async fn before_request(&self, request: HttpRequest) -> Result<HttpRequest, PluginError> {
        self(request)
    }
}

#[async_trait]
impl<F> PostResponseHook for F
where
    F: Fn(&HttpRequest, HttpResponse) -> Result<HttpResponse, PluginError> + Send + Sync,
{
    async fn after_response(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
    ) -> Result<HttpResponse, PluginError> {
        self(request, response)
    }
}

/// One loaded plugin: its name plus everything it contributes.
#[derive(Clone, Default)]
pub struct Plugin {
    name: String,
    variables: HashMap<String, Arc<dyn VariableSource>>,
    functions: HashMap<String, Arc<dyn ParameterizedSource>>,
    pre_request_hooks: Vec<Arc<dyn PreRequestHook>>,
    post_response_hooks: Vec<Arc<dyn PostResponseHook>>,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_variable(mut self, name: impl Into<String>, source: impl VariableSource + 'static) -> Self {
        self.variables.insert(name.into(), Arc::new(source));
        self
    }

    /// Same as [`Plugin::with_variable`], with the closure signature spelled out
    /// so plain closures infer their types.
    pub fn with_variable_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Result<Value, PluginError> + Send + Sync + 'static,
    {
        self.with_variable(name, f)
    }

    pub fn with_function(
        mut self,
        name: impl Into<String>,
        source: impl ParameterizedSource + 'static,
    ) -> Self {
        self.functions.insert(name.into(), Arc::new(source));
        self
    }

    pub fn with_function_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[String]) -> Result<Value, PluginError> + Send + Sync + 'static,
    {
        self.with_function(name, f)
    }

    pub fn with_pre_request_hook(mut self, hook: impl PreRequestHook + 'static) -> Self {
        self.pre_request_hooks.push(Arc::new(hook));
        self
    }

    pub fn with_pre_request_hook_fn<F>(self, f: F) -> Self
    where
        F: Fn(HttpRequest) -> Result<HttpRequest, PluginError> + Send + Sync + 'static,
    {
        self.with_pre_request_hook(f)
    }

    pub fn with_post_response_hook(mut self, hook: impl PostResponseHook + 'static) -> Self {
        self.post_response_hooks.push(Arc::new(hook));
        self
    }

    pub fn with_post_response_hook_fn<F>(self, f: F) -> Self
    where
        F: Fn(&HttpRequest, HttpResponse) -> Result<HttpResponse, PluginError>
            + Send
            + Sync
            + 'static,
    {
        self.with_post_response_hook(f)
    }

    pub(crate) fn variable(&self, name: &str) -> Option<&Arc<dyn VariableSource>> {
        self.variables.get(name)
    }

    pub(crate) fn function(&self, name: &str) -> Option<&Arc<dyn ParameterizedSource>> {
        self.functions.get(name)
    }

    pub(crate) fn pre_request_hooks(&self) -> &[Arc<dyn PreRequestHook>] {
        &self.pre_request_hooks
    }

    pub(crate) fn post_response_hooks(&self) -> &[Arc<dyn PostResponseHook>] {
        &self.post_response_hooks
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut variables: Vec<_> = self.variables.keys().collect();
        variables.sort();
        let mut functions: Vec<_> = self.functions.keys().collect();
        functions.sort();

        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("variables", &variables)
            .field("functions", &functions)
            .field("pre_request_hooks", &self.pre_request_hooks.len())
            .field("post_response_hooks", &self.post_response_hooks.len())
            .finish()
    }
}

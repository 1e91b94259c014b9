//! Ordered collection of loaded plugins.

use super::Plugin;
use crate::models::{HttpRequest, HttpResponse};
use crate::variables::VarError;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Which hook list a [`HookError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    PreRequest,
    PostResponse,
}

impl std::fmt::Display for HookStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookStage::PreRequest => write!(f, "pre-request"),
            HookStage::PostResponse => write!(f, "post-response"),
        }
    }
}

/// A hook failed; carries the offending plugin's name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Plugin '{plugin}' {stage} hook failed: {message}")]
pub struct HookError {
    pub plugin: String,
    pub stage: HookStage,
    pub message: String,
}

/// Plugins in registration order. Cloning shares the underlying list.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Arc<Vec<Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plugin. A plugin with the same name replaces the earlier one in place.
    pub fn register(&mut self, plugin: Plugin) {
        let plugins = Arc::make_mut(&mut self.plugins);
        match plugins.iter_mut().find(|p| p.name() == plugin.name()) {
            Some(existing) => *existing = plugin,
            None => plugins.push(plugin),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(Plugin::name).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Resolves `plugins.PLUGIN.FUNCTION` or `plugins.PLUGIN.FUNCTION(args)`.
    ///
    /// Without parentheses the named variable source is preferred and a
    /// parameterized source is called with no arguments as a fallback. With
    /// parentheses the parameterized source is preferred.
    pub async fn resolve_variable(
        &self,
        plugin_name: &str,
        function: &str,
        args: Option<&[String]>,
    ) -> Result<Value, VarError> {
        let expression = match args {
            Some(args) => format!("plugins.{}.{}({})", plugin_name, function, args.join(", ")),
            None => format!("plugins.{}.{}", plugin_name, function),
        };

        let plugin = self
            .get(plugin_name)
            .ok_or_else(|| VarError::PluginNotFound {
                plugin: plugin_name.to_string(),
                expression: expression.clone(),
            })?;

        log::debug!("Resolving plugin variable '{}'", expression);

        let result = match (args, plugin.variable(function), plugin.function(function)) {
            (Some(args), _, Some(func)) => func.call(args).await,
            (Some(args), Some(source), None) if args.is_empty() => source.get().await,
            (None, Some(source), _) => source.get().await,
            (None, None, Some(func)) => func.call(&[]).await,
            _ => {
                return Err(VarError::PluginVariableNotFound {
                    plugin: plugin_name.to_string(),
                    function: function.to_string(),
                    expression,
                })
            }
        };

        result.map_err(|e| VarError::PluginFailed {
            plugin: plugin_name.to_string(),
            function: function.to_string(),
            message: e.message,
            expression,
        })
    }

    /// Runs every pre-request hook in registration order.
    pub async fn run_pre_request_hooks(
        &self,
        mut request: HttpRequest,
    ) -> Result<HttpRequest, HookError> {
        for plugin in self.plugins.iter() {
            for hook in plugin.pre_request_hooks() {
                request = hook
                    .before_request(request)
                    .await
                    .map_err(|e| HookError {
                        plugin: plugin.name().to_string(),
                        stage: HookStage::PreRequest,
                        message: e.message,
                    })?;
            }
        }
        Ok(request)
    }

    /// Runs every post-response hook in registration order.
    pub async fn run_post_response_hooks(
        &self,
        request: &HttpRequest,
        mut response: HttpResponse,
    ) -> Result<HttpResponse, HookError> {
        for plugin in self.plugins.iter() {
            for hook in plugin.post_response_hooks() {
                response = hook
                    .after_response(request, response)
                    .await
                    .map_err(|e| HookError {
                        plugin: plugin.name().to_string(),
                        stage: HookStage::PostResponse,
                        message: e.message,
                    })?;
            }
        }
        Ok(response)
    }
}

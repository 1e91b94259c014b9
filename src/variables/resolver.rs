//! The variable resolution engine.
//!
//! [`VariableResolver::resolve`] reduces a template inside-out: every pass
//! resolves the innermost `{{...}}` spans and splices their values back in,
//! until no span is left. Resolved values are rescanned, so a variable whose
//! value is itself a template gets expanded too. A pass limit guards against
//! circular definitions.

use super::context::{VariableContext, VariableMap};
use super::dynamic::resolve_dynamic_variable;
use super::profiles::merge_profiles;
use super::scanner::{has_expressions, scan, splice};
use super::scope::{classify, VariableRef};
use super::secrets::SecretRegistry;
use super::steps::{evaluate_path, step_data};
use super::VarError;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// Default limit on scan-and-replace passes per template.
pub const MAX_RESOLUTION_ITERATIONS: usize = 10;

/// Future returned by [`VariableResolver::resolve_value`].
pub type ValueFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, VarError>> + 'a>>;

/// Converts a resolved value to the text spliced into a template.
///
/// Strings are used as-is, `null` becomes `"null"`, numbers and booleans use
/// their literal text, objects and arrays become compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Resolves templates against a [`VariableContext`] and tracks the secrets
/// it resolves along the way.
///
/// One resolver is meant to live for one top-level invocation; its
/// [`SecretRegistry`] is shared by every clone.
#[derive(Debug, Clone)]
pub struct VariableResolver {
    secrets: SecretRegistry,
    max_iterations: usize,
}

impl Default for VariableResolver {
    fn default() -> Self {
        Self {
            secrets: SecretRegistry::new(),
            max_iterations: MAX_RESOLUTION_ITERATIONS,
        }
    }
}

impl VariableResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the pass limit. Values below 1 are raised to 1.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn secrets(&self) -> &SecretRegistry {
        &self.secrets
    }

    /// Resolves every `{{...}}` expression in `template`.
    ///
    /// Fails on the first expression that cannot be resolved; no partially
    /// substituted text is returned.
    pub async fn resolve(&self, template: &str, ctx: &VariableContext) -> Result<String, VarError> {
        let resolved = self.reduce(template, ctx, false).await?;
        Ok(resolved.unwrap_or_default())
    }

    /// Resolves a single header or query parameter value.
    ///
    /// Returns `Ok(None)` when an optional reference (`{{name?}}`) in the
    /// value is undefined or `null`, meaning the field should be left out of
    /// the request.
    pub async fn resolve_field(
        &self,
        template: &str,
        ctx: &VariableContext,
    ) -> Result<Option<String>, VarError> {
        self.reduce(template, ctx, true).await
    }

    /// Resolves every string leaf of a nested structure.
    ///
    /// Numbers, booleans and `null` are returned untouched and the shape of
    /// objects and arrays is preserved.
    pub fn resolve_value<'a>(&'a self, value: &'a Value, ctx: &'a VariableContext) -> ValueFuture<'a> {
        Box::pin(async move {
            match value {
                Value::String(s) => Ok(Value::String(self.resolve(s, ctx).await?)),
                Value::Array(items) => {
                    let mut resolved = Vec::with_capacity(items.len());
                    for item in items {
                        resolved.push(self.resolve_value(item, ctx).await?);
                    }
                    Ok(Value::Array(resolved))
                }
                Value::Object(map) => {
                    let mut resolved = serde_json::Map::with_capacity(map.len());
                    for (key, item) in map {
                        resolved.insert(key.clone(), self.resolve_value(item, ctx).await?);
                    }
                    Ok(Value::Object(resolved))
                }
                other => Ok(other.clone()),
            }
        })
    }

    /// Merges active profiles; see [`merge_profiles`]. The verbose audit is
    /// masked with this resolver's secrets.
    pub fn merge_profiles(
        &self,
        names: &[String],
        profiles: &HashMap<String, VariableMap>,
        verbose: bool,
    ) -> VariableMap {
        merge_profiles(names, profiles, verbose, &self.secrets)
    }

    /// Replaces every resolved secret value in `text` with `[SECRET]`.
    pub fn mask_secrets(&self, text: &str) -> String {
        self.secrets.mask(text)
    }

    /// The secrets resolved so far, keyed `secret.K`.
    pub fn secret_variables(&self) -> HashMap<String, String> {
        self.secrets.secret_variables()
    }

    /// Forgets every tracked secret. Call once per top-level invocation.
    pub fn reset_secret_tracking(&self) {
        self.secrets.reset();
    }

    /// Scan-and-replace loop shared by [`resolve`](Self::resolve) and
    /// [`resolve_field`](Self::resolve_field). `Ok(None)` is only produced
    /// when `omit_optional` is set.
    async fn reduce(
        &self,
        template: &str,
        ctx: &VariableContext,
        omit_optional: bool,
    ) -> Result<Option<String>, VarError> {
        let mut current = template.to_string();

        for pass in 0..self.max_iterations {
            let spans = scan(&current);
            if spans.is_empty() {
                return Ok(Some(current));
            }
            log::trace!("Resolution pass {} over {} span(s)", pass + 1, spans.len());

            let mut values = Vec::with_capacity(spans.len());
            for span in &spans {
                let reference = classify(&span.expression)?;
                let optional = omit_optional && reference.is_optional();

                match self.resolve_reference(&reference, &span.expression, ctx).await {
                    Ok(Value::Null) if optional => return Ok(None),
                    Ok(value) => values.push(stringify(&value)),
                    Err(e) if optional && e.is_undefined() => {
                        log::debug!("Optional variable '{}' is undefined, omitting field", e.variable_name());
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                }
            }

            current = splice(&current, &spans, &values);
        }

        if has_expressions(&current) {
            return Err(VarError::MaxIterations {
                template: template.to_string(),
            });
        }
        Ok(Some(current))
    }

    async fn resolve_reference(
        &self,
        reference: &VariableRef,
        expression: &str,
        ctx: &VariableContext,
    ) -> Result<Value, VarError> {
        match reference {
            VariableRef::Unscoped { name, .. } => {
                ctx.lookup_unscoped(name)
                    .cloned()
                    .ok_or_else(|| VarError::Undefined { name: name.clone() })
            }
            VariableRef::Profile { key, .. } => scoped_lookup(&ctx.profiles, "profile", key),
            VariableRef::Api { key, .. } => scoped_lookup(&ctx.api, "api", key),
            VariableRef::Endpoint { key, .. } => scoped_lookup(&ctx.endpoint, "endpoint", key),
            VariableRef::Env { key, .. } => ctx
                .env
                .get(key)
                .map(|v| Value::String(v.clone()))
                .ok_or_else(|| VarError::EnvNotDefined { key: key.clone() }),
            VariableRef::Secret { key, .. } => {
                let value = ctx
                    .env
                    .get(key)
                    .ok_or_else(|| VarError::SecretNotDefined { key: key.clone() })?;
                self.secrets.register(format!("secret.{}", key), value.clone());
                Ok(Value::String(value.clone()))
            }
            VariableRef::Dynamic { name } => resolve_dynamic_variable(name).map(Value::String),
            VariableRef::Plugin {
                plugin,
                function,
                args,
            } => {
                ctx.plugins
                    .resolve_variable(plugin, function, args.as_deref())
                    .await
            }
            VariableRef::Step {
                step_id,
                kind,
                path,
            } => {
                if ctx.steps.is_none() {
                    return Err(VarError::NoStepsInContext {
                        expression: expression.to_string(),
                    });
                }
                let step = ctx
                    .find_step(step_id)
                    .ok_or_else(|| VarError::StepNotFound {
                        step_id: step_id.clone(),
                        expression: expression.to_string(),
                    })?;

                let data = step_data(step, *kind);
                match path {
                    None => Ok(data),
                    Some(path) => evaluate_path(&data, path).cloned().ok_or_else(|| {
                        VarError::PathNotFound {
                            path: path.clone(),
                            expression: expression.to_string(),
                        }
                    }),
                }
            }
        }
    }
}

fn scoped_lookup(map: &VariableMap, scope: &str, key: &str) -> Result<Value, VarError> {
    map.get(key).cloned().ok_or_else(|| VarError::Undefined {
        name: format!("{}.{}", scope, key),
    })
}

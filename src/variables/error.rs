//! Variable resolution errors.

use thiserror::Error;

/// Errors that can occur while resolving a `{{...}}` expression.
///
/// Every variant names the variable (or expression) that failed; see
/// [`VarError::variable_name`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VarError {
    /// Unscoped, `profile.`, `api.` or `endpoint.` lookup found nothing.
    #[error("Variable '{name}' could not be resolved")]
    Undefined { name: String },

    /// `env.K` where `K` is not in the environment snapshot.
    #[error("Environment variable '{key}' is not defined")]
    EnvNotDefined { key: String },

    /// `secret.K` where `K` is not in the environment snapshot.
    #[error("Secret variable '{key}' is not defined")]
    SecretNotDefined { key: String },

    /// `$NAME` that is not a known generator.
    #[error("Unknown dynamic variable '${name}'")]
    UnknownDynamic { name: String },

    /// `plugins.NAME...` where no plugin `NAME` is registered.
    #[error("Plugin '{plugin}' not found")]
    PluginNotFound { plugin: String, expression: String },

    /// The plugin exists but exposes no such variable or function.
    #[error("Variable '{function}' not found in plugin '{plugin}'")]
    PluginVariableNotFound {
        plugin: String,
        function: String,
        expression: String,
    },

    /// The plugin source itself returned an error.
    #[error("Plugin '{plugin}' failed to resolve '{function}': {message}")]
    PluginFailed {
        plugin: String,
        function: String,
        message: String,
        expression: String,
    },

    /// `plugins.` expression that is not `plugins.NAME.FUNC[(args)]`.
    #[error("Invalid plugin variable format '{expression}'")]
    InvalidPluginFormat { expression: String },

    /// `steps.ID` without a `KIND` segment.
    #[error("Invalid step variable format '{expression}'")]
    InvalidStepFormat { expression: String },

    /// `steps.ID.KIND` where `KIND` is neither `request` nor `response`.
    #[error("Invalid step data type '{kind}'")]
    InvalidStepDataType { kind: String, expression: String },

    /// `steps.ID...` referencing a step that has not run.
    #[error("Step '{step_id}' not found in executed steps")]
    StepNotFound { step_id: String, expression: String },

    /// `steps.` expression outside of a chain run.
    #[error("Step variable '{expression}' is not available (no steps in context)")]
    NoStepsInContext { expression: String },

    /// The path after `steps.ID.KIND` selected nothing.
    #[error("JSONPath '$.{path}' found no matches")]
    PathNotFound { path: String, expression: String },

    /// Nested or chained references did not settle within the iteration cap.
    #[error("Maximum variable resolution iterations reached")]
    MaxIterations { template: String },
}

impl VarError {
    /// Name of the variable or expression this error refers to.
    pub fn variable_name(&self) -> String {
        match self {
            VarError::Undefined { name } => name.clone(),
            VarError::EnvNotDefined { key } => format!("env.{}", key),
            VarError::SecretNotDefined { key } => format!("secret.{}", key),
            VarError::UnknownDynamic { name } => format!("${}", name),
            VarError::PluginNotFound { expression, .. }
            | VarError::PluginVariableNotFound { expression, .. }
            | VarError::PluginFailed { expression, .. }
            | VarError::InvalidPluginFormat { expression }
            | VarError::InvalidStepFormat { expression }
            | VarError::InvalidStepDataType { expression, .. }
            | VarError::StepNotFound { expression, .. }
            | VarError::NoStepsInContext { expression }
            | VarError::PathNotFound { expression, .. } => expression.clone(),
            VarError::MaxIterations { template } => template.clone(),
        }
    }

    /// True when the failure means "this variable has no value" as opposed to
    /// a malformed expression or a failing source. Optional markers (`{{x?}}`)
    /// only swallow this kind of failure.
    pub fn is_undefined(&self) -> bool {
        matches!(
            self,
            VarError::Undefined { .. }
                | VarError::EnvNotDefined { .. }
                | VarError::SecretNotDefined { .. }
        )
    }
}

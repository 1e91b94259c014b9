//! Configuration model for REST Chain.
//!
//! Configuration files are parsed and their imports merged by the caller; this
//! module receives the merged document as JSON, deserializes it, fills in
//! defaults for the runner settings and validates the result.

pub mod project;
pub mod schema;

pub use project::{
    ApiDefinition, ChainDefinition, ChainStep, EndpointDefinition, ProjectConfig, StepOverrides,
};
pub use schema::RunnerSettings;

use serde_json::Value;
use thiserror::Error;

/// Errors produced while loading or validating a project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Endpoint '{api}.{endpoint}' has invalid method '{method}'")]
    InvalidMethod {
        api: String,
        endpoint: String,
        method: String,
    },

    #[error("Chain '{chain}' has a step without an id")]
    EmptyStepId { chain: String },

    #[error("Chain '{chain}' has duplicate step id '{step}'")]
    DuplicateStepId { chain: String, step: String },

    #[error("Step '{step}' in chain '{chain}' has invalid call '{call}' (expected 'api.endpoint')")]
    InvalidCall {
        chain: String,
        step: String,
        call: String,
    },
}

/// Loads a project configuration from its merged JSON form.
///
/// # Example
///
/// ```
/// use rest_chain::config::load_config;
/// use serde_json::json;
///
/// let config = load_config(json!({
///     "apis": { "svc": { "baseUrl": "http://localhost", "endpoints": {} } },
///     "config": { "timeoutMs": 5000 }
/// }))
/// .unwrap();
///
/// assert_eq!(config.config.timeout_ms, 5000);
/// assert_eq!(config.config.max_resolution_iterations, 10);
/// ```
pub fn load_config(document: Value) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        serde_json::from_value(document).map_err(|e| ConfigError::Parse(e.to_string()))?;

    config.validate()?;

    log::debug!(
        "Loaded configuration: {} API(s), {} profile(s), {} chain(s)",
        config.apis.len(),
        config.profiles.len(),
        config.chains.len()
    );

    Ok(config)
}

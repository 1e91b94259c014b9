//! Project configuration model: APIs, endpoints, profiles, global variables
//! and chains, as handed over by the configuration loader.

use super::schema::RunnerSettings;
use super::ConfigError;
use crate::models::HttpMethod;
use crate::variables::VariableMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// A fully loaded and merged project configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub apis: HashMap<String, ApiDefinition>,

    /// Named profiles; several can be active at once.
    #[serde(default)]
    pub profiles: HashMap<String, VariableMap>,

    /// Global variables, the lowest-precedence unscoped layer.
    #[serde(default)]
    pub variables: VariableMap,

    #[serde(default)]
    pub chains: HashMap<String, ChainDefinition>,

    #[serde(default)]
    pub config: RunnerSettings,
}

/// One API: a base URL plus defaults shared by all of its endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefinition {
    pub base_url: String,

    #[serde(default)]
    pub headers: HashMap<String, Value>,

    #[serde(default)]
    pub params: HashMap<String, Value>,

    #[serde(default)]
    pub variables: VariableMap,

    #[serde(default)]
    pub endpoints: HashMap<String, EndpointDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDefinition {
    #[serde(default = "default_method")]
    pub method: String,

    pub path: String,

    #[serde(default)]
    pub headers: HashMap<String, Value>,

    #[serde(default)]
    pub params: HashMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    #[serde(default)]
    pub variables: VariableMap,
}

impl EndpointDefinition {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            params: HashMap::new(),
            body: None,
            variables: VariableMap::new(),
        }
    }
}

/// An ordered list of steps sharing chain-level variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub vars: VariableMap,

    #[serde(default)]
    pub steps: Vec<ChainStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStep {
    pub id: String,

    /// `apiName.endpointName`
    pub call: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with: Option<StepOverrides>,
}

impl ChainStep {
    pub fn new(id: impl Into<String>, call: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            call: call.into(),
            ..Self::default()
        }
    }

    pub fn with_overrides(mut self, with: StepOverrides) -> Self {
        self.with = Some(with);
        self
    }

    /// Splits `call` into `(api, endpoint)` at the first dot.
    pub fn target(&self) -> Option<(&str, &str)> {
        self.call
            .split_once('.')
            .filter(|(api, endpoint)| !api.is_empty() && !endpoint.is_empty())
    }
}

/// Per-step overrides layered over the endpoint definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOverrides {
    #[serde(default)]
    pub headers: HashMap<String, Value>,

    #[serde(default)]
    pub params: HashMap<String, Value>,

    #[serde(default)]
    pub path_params: VariableMap,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ProjectConfig {
    /// The requested profiles, or `defaultProfile` when none were requested.
    pub fn profile_names_or_default(&self, requested: &[String]) -> Vec<String> {
        if requested.is_empty() {
            self.config.default_profile.clone()
        } else {
            requested.to_vec()
        }
    }

    /// Checks structural rules the loader cannot express in the schema.
    ///
    /// References from a step's `call` to an existing API and endpoint are
    /// not checked here; a missing target fails the chain when it is reached.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate().map_err(ConfigError::Invalid)?;

        let mut api_names: Vec<&String> = self.apis.keys().collect();
        api_names.sort();
        for api_name in api_names {
            let api = &self.apis[api_name];
            let mut endpoint_names: Vec<&String> = api.endpoints.keys().collect();
            endpoint_names.sort();
            for endpoint_name in endpoint_names {
                let method = &api.endpoints[endpoint_name].method;
                if HttpMethod::parse(method).is_none() {
                    return Err(ConfigError::InvalidMethod {
                        api: api_name.clone(),
                        endpoint: endpoint_name.clone(),
                        method: method.clone(),
                    });
                }
            }
        }

        let mut chain_names: Vec<&String> = self.chains.keys().collect();
        chain_names.sort();
        for chain_name in chain_names {
            let mut seen = HashSet::new();
            for step in &self.chains[chain_name].steps {
                if step.id.trim().is_empty() {
                    return Err(ConfigError::EmptyStepId {
                        chain: chain_name.clone(),
                    });
                }
                if !seen.insert(step.id.as_str()) {
                    return Err(ConfigError::DuplicateStepId {
                        chain: chain_name.clone(),
                        step: step.id.clone(),
                    });
                }
                if step.target().is_none() {
                    return Err(ConfigError::InvalidCall {
                        chain: chain_name.clone(),
                        step: step.id.clone(),
                        call: step.call.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn default_method() -> String {
    "GET".to_string()
}

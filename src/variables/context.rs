//! Variable sources available to a single resolution call.

use crate::chain::StepExecutionResult;
use crate::plugins::PluginRegistry;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A key→value variable map. Values keep their JSON type until stringified.
pub type VariableMap = HashMap<String, Value>;

/// Names of the unscoped layers, highest precedence first.
pub const UNSCOPED_PRECEDENCE: [&str; 7] = [
    "cli",
    "stepWith",
    "chainVars",
    "endpoint",
    "api",
    "profiles",
    "globalVariables",
];

/// Context for variable resolution containing all available variable sources.
///
/// Unscoped lookups walk `cli → step_with → chain_vars → endpoint → api →
/// profiles → global_variables` and stop at the first map that contains the
/// key. `env`, `plugins` and `steps` are only reachable through their scope
/// prefixes.
#[derive(Debug, Clone, Default)]
pub struct VariableContext {
    /// Variables given on the command line.
    pub cli: VariableMap,

    /// Per-step overrides of a chain step (`with.pathParams`).
    pub step_with: VariableMap,

    /// Chain-level defaults (`vars` of the chain definition).
    pub chain_vars: VariableMap,

    /// Variables declared on the endpoint being called.
    pub endpoint: VariableMap,

    /// Variables declared on the API being called.
    pub api: VariableMap,

    /// The merged active profiles.
    pub profiles: VariableMap,

    /// Project-wide variables.
    pub global_variables: VariableMap,

    /// Process environment snapshot.
    pub env: HashMap<String, String>,

    /// Registered plugin sources.
    pub plugins: PluginRegistry,

    /// Results of the steps executed so far, `None` outside of a chain run.
    /// Shared with the chain engine, which owns the history.
    pub steps: Option<Arc<Vec<StepExecutionResult>>>,
}

impl VariableContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// The unscoped layers in precedence order, paired with their names.
    pub fn unscoped_layers(&self) -> [(&'static str, &VariableMap); 7] {
        [
            (UNSCOPED_PRECEDENCE[0], &self.cli),
            (UNSCOPED_PRECEDENCE[1], &self.step_with),
            (UNSCOPED_PRECEDENCE[2], &self.chain_vars),
            (UNSCOPED_PRECEDENCE[3], &self.endpoint),
            (UNSCOPED_PRECEDENCE[4], &self.api),
            (UNSCOPED_PRECEDENCE[5], &self.profiles),
            (UNSCOPED_PRECEDENCE[6], &self.global_variables),
        ]
    }

    /// Looks up an unscoped name. An explicit `null` counts as present.
    pub fn lookup_unscoped(&self, name: &str) -> Option<&Value> {
        self.unscoped_layers()
            .into_iter()
            .find_map(|(_, layer)| layer.get(name))
    }

    /// Finds a recorded step by id.
    pub fn find_step(&self, step_id: &str) -> Option<&StepExecutionResult> {
        self.steps
            .as_ref()
            .and_then(|steps| steps.iter().find(|s| s.step_id == step_id))
    }
}

//! Runner settings schema.
//!
//! This module defines the `config` section of a project configuration and
//! its validation logic.

use serde::{Deserialize, Serialize};

/// Upper bound accepted for `maxResolutionIterations`.
pub const MAX_RESOLUTION_ITERATIONS_LIMIT: usize = 100;

/// Settings that control how requests and chains are run.
///
/// Missing settings fall back to sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerSettings {
    /// Request timeout in milliseconds.
    ///
    /// Maximum time to wait for a complete response. Defaults to 30000ms
    /// (30 seconds).
    ///
    /// Must be greater than 0.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Profiles activated when none are requested explicitly.
    ///
    /// Accepts a single name or a list. Defaults to none.
    #[serde(default, deserialize_with = "one_or_many")]
    pub default_profile: Vec<String>,

    /// Pattern of HTTP statuses that should produce a failing exit status,
    /// e.g. `"4xx"`, `"401,403"` or `"true"`. Unset means never.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_on_http_error: Option<String>,

    /// Limit on nested-expression reduction passes. Defaults to 10.
    ///
    /// Must be between 1 and 100.
    #[serde(default = "default_max_resolution_iterations")]
    pub max_resolution_iterations: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            default_profile: Vec::new(),
            exit_on_http_error: None,
            max_resolution_iterations: default_max_resolution_iterations(),
        }
    }
}

impl RunnerSettings {
    /// Validates the settings and returns a descriptive error for the first
    /// invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err("timeoutMs must be greater than 0".to_string());
        }

        if self.max_resolution_iterations == 0
            || self.max_resolution_iterations > MAX_RESOLUTION_ITERATIONS_LIMIT
        {
            return Err(format!(
                "maxResolutionIterations must be between 1 and {}",
                MAX_RESOLUTION_ITERATIONS_LIMIT
            ));
        }

        if let Some(pattern) = &self.exit_on_http_error {
            crate::chain::HttpErrorPolicy::parse(pattern).map_err(|e| e.to_string())?;
        }

        Ok(())
    }

    /// Returns the timeout as a `std::time::Duration`.
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    /// Returns the timeout in whole seconds, rounded up.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_ms.div_ceil(1000)
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(name) => vec![name],
        OneOrMany::Many(names) => names,
    })
}

// Default value functions for serde

fn default_timeout_ms() -> u64 {
    30000 // 30 seconds in milliseconds
}

fn default_max_resolution_iterations() -> usize {
    crate::variables::MAX_RESOLUTION_ITERATIONS
}

//! HTTP request execution configuration.

use crate::config::RunnerSettings;
use serde::{Deserialize, Serialize};

/// Configuration for HTTP request execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Request timeout in seconds.
    ///
    /// Maximum time to wait for a complete response (including connection,
    /// headers, and body download). Defaults to 30 seconds.
    pub timeout_secs: u64,
}

impl ExecutionConfig {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    /// Builds the execution config from the project's runner settings.
    pub fn from_settings(settings: &RunnerSettings) -> Self {
        Self {
            timeout_secs: settings.timeout_secs(),
        }
    }

    /// Returns the timeout as a `std::time::Duration`.
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self::from_settings(&RunnerSettings::default())
    }
}

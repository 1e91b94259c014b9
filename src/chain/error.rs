//! Chain execution errors.

use crate::executor::RequestError;
use crate::plugins::HookError;
use crate::variables::VarError;
use thiserror::Error;

/// A step's `call` does not name an existing API and endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainLookupError {
    #[error("API '{api}' not found in configuration")]
    ApiNotFound { api: String },

    #[error("Endpoint '{endpoint}' not found in API '{api}'")]
    EndpointNotFound { api: String, endpoint: String },

    #[error("Invalid call '{call}' (expected 'api.endpoint')")]
    InvalidCall { call: String },
}

/// Why a chain (or a single endpoint call) stopped.
///
/// `step_id` is the chain step id, or `api.endpoint` for a single endpoint
/// call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error(transparent)]
    Lookup(#[from] ChainLookupError),

    #[error("Step '{step_id}' failed: {source}")]
    Variable { step_id: String, source: VarError },

    #[error("Step '{step_id}' failed: Invalid HTTP method '{method}'")]
    InvalidMethod { step_id: String, method: String },

    #[error("Step '{step_id}' failed: {source}")]
    Hook { step_id: String, source: HookError },

    #[error("Step '{step_id}' failed: {source}")]
    Transport { step_id: String, source: RequestError },

    /// The request completed with a status at or above 400.
    #[error("HTTP {status} {status_text}")]
    Http {
        step_id: String,
        status: u16,
        status_text: String,
    },
}

impl ChainError {
    /// The step the failure belongs to, if it got that far.
    pub fn step_id(&self) -> Option<&str> {
        match self {
            ChainError::Lookup(_) => None,
            ChainError::Variable { step_id, .. }
            | ChainError::InvalidMethod { step_id, .. }
            | ChainError::Hook { step_id, .. }
            | ChainError::Transport { step_id, .. }
            | ChainError::Http { step_id, .. } => Some(step_id),
        }
    }

    /// Process exit status distinguishing the failure classes.
    pub fn exit_code(&self) -> i32 {
        match self {
            ChainError::Http { .. } => 1,
            ChainError::Lookup(_) => 2,
            ChainError::Variable { .. } | ChainError::InvalidMethod { .. } => 3,
            ChainError::Hook { .. } => 4,
            ChainError::Transport { .. } => 5,
        }
    }
}

//! Step and chain results.

use super::ChainError;
use crate::models::{HttpRequest, HttpResponse};
use crate::variables::steps::step_data;
use crate::variables::StepDataKind;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Statuses at or above this value fail a step and halt the chain.
pub const STEP_FAILURE_STATUS: u16 = 400;

/// The recorded outcome of one executed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepExecutionResult {
    pub step_id: String,
    pub request: HttpRequest,
    pub response: HttpResponse,
    pub success: bool,
    pub error: Option<String>,
}

impl StepExecutionResult {
    /// Records a step; success is derived from the response status.
    pub fn new(step_id: impl Into<String>, request: HttpRequest, response: HttpResponse) -> Self {
        let success = response.status < STEP_FAILURE_STATUS;
        let error = (!success).then(|| format!("HTTP {} {}", response.status, response.status_text));
        Self {
            step_id: step_id.into(),
            request,
            response,
            success,
            error,
        }
    }
}

/// Outcome of a whole chain run.
///
/// `steps` holds every step that produced a response, in execution order,
/// including a final failing one. Steps after a failure never run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainResult {
    pub chain_name: String,
    pub success: bool,
    pub steps: Vec<StepExecutionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// The typed failure behind `error`.
    #[serde(skip)]
    pub failure: Option<ChainError>,
}

impl ChainResult {
    pub(crate) fn succeeded(chain_name: impl Into<String>, steps: Vec<StepExecutionResult>) -> Self {
        Self {
            chain_name: chain_name.into(),
            success: true,
            steps,
            error: None,
            failure: None,
        }
    }

    pub(crate) fn failed(
        chain_name: impl Into<String>,
        steps: Vec<StepExecutionResult>,
        message: String,
        failure: ChainError,
    ) -> Self {
        Self {
            chain_name: chain_name.into(),
            success: false,
            steps,
            error: Some(message),
            failure: Some(failure),
        }
    }

    /// Raw response body of the last successful step.
    pub fn default_output(&self) -> Option<&str> {
        self.steps
            .iter()
            .rev()
            .find(|step| step.success)
            .map(|step| step.response.body.as_str())
    }

    /// Structured output with request and response bodies parsed as JSON
    /// when they are valid JSON text.
    pub fn to_full_json(&self) -> Value {
        let steps: Vec<Value> = self
            .steps
            .iter()
            .map(|step| {
                json!({
                    "stepId": step.step_id,
                    "request": step_data(step, StepDataKind::Request),
                    "response": step_data(step, StepDataKind::Response),
                    "success": step.success,
                    "error": step.error,
                })
            })
            .collect();

        let mut output = json!({
            "chainName": self.chain_name,
            "success": self.success,
            "steps": steps,
        });
        if let (Some(error), Value::Object(map)) = (&self.error, &mut output) {
            map.insert("error".to_string(), Value::String(error.clone()));
        }
        output
    }

    /// Exit status for a CLI: 0 on success, otherwise the failure's code.
    pub fn exit_code(&self) -> i32 {
        match &self.failure {
            None if self.success => 0,
            None => 1,
            Some(failure) => failure.exit_code(),
        }
    }
}

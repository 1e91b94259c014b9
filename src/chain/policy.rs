//! Exit-on-HTTP-error policy.
//!
//! Chains always halt on a status of 400 or more. Whether such a status should
//! also turn into a failing process exit is a separate, configurable decision
//! expressed by an [`HttpErrorPolicy`].

use super::ChainResult;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid exit-on-http-error pattern '{0}'")]
pub struct PolicyError(pub String);

/// One entry of a comma-separated policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPattern {
    /// A single status code, e.g. `404`.
    Exact(u16),
    /// A status class by its leading digit, e.g. `4xx` is `Class(4)`.
    Class(u16),
}

impl StatusPattern {
    fn matches(&self, status: u16) -> bool {
        match self {
            StatusPattern::Exact(code) => status == *code,
            StatusPattern::Class(class) => status / 100 == *class,
        }
    }
}

/// Which response statuses count as errors for exit-status purposes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HttpErrorPolicy {
    #[default]
    Never,
    /// Any status of 400 or more.
    AnyError,
    Patterns(Vec<StatusPattern>),
}

impl HttpErrorPolicy {
    /// Parses `"true"`/`"all"`, `"false"`/`"none"`, or a comma-separated list
    /// of codes and classes such as `"4xx"` or `"401,403,5xx"`.
    pub fn parse(pattern: &str) -> Result<Self, PolicyError> {
        let normalized = pattern.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "" | "false" | "none" => return Ok(HttpErrorPolicy::Never),
            "true" | "all" => return Ok(HttpErrorPolicy::AnyError),
            _ => {}
        }

        let patterns = normalized
            .split(',')
            .map(|part| parse_status_pattern(part.trim()).ok_or_else(|| PolicyError(pattern.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(HttpErrorPolicy::Patterns(patterns))
    }

    /// Builds the policy from the optional `exitOnHttpError` setting.
    pub fn from_setting(setting: Option<&str>) -> Result<Self, PolicyError> {
        setting.map_or(Ok(HttpErrorPolicy::Never), Self::parse)
    }

    pub fn matches(&self, status: u16) -> bool {
        match self {
            HttpErrorPolicy::Never => false,
            HttpErrorPolicy::AnyError => status >= 400,
            HttpErrorPolicy::Patterns(patterns) => patterns.iter().any(|p| p.matches(status)),
        }
    }

    /// True if any recorded step of `result` has a matching status.
    pub fn matches_result(&self, result: &ChainResult) -> bool {
        result.steps.iter().any(|step| self.matches(step.response.status))
    }
}

fn parse_status_pattern(part: &str) -> Option<StatusPattern> {
    if let Some(class) = part.strip_suffix("xx") {
        let class: u16 = class.parse().ok()?;
        return (1..=5).contains(&class).then_some(StatusPattern::Class(class));
    }

    let code: u16 = part.parse().ok()?;
    (100..=599).contains(&code).then_some(StatusPattern::Exact(code))
}

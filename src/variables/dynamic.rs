//! Dynamic variable generators for REST Chain
//!
//! This module implements the `$` variables: {{$timestamp}}, {{$isoTimestamp}},
//! {{$randomInt}} and {{$guid}}. Each reference produces a fresh value.

use super::VarError;
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use uuid::Uuid;

/// Upper bound (inclusive) of `$randomInt`.
pub const RANDOM_INT_MAX: u32 = 999_999;

/// Names accepted after the `$` prefix.
pub const DYNAMIC_VARIABLES: [&str; 4] = ["timestamp", "isoTimestamp", "randomInt", "guid"];

/// Resolves a dynamic variable by name (without the `$` prefix).
///
/// # Examples
/// ```
/// use rest_chain::variables::dynamic::resolve_dynamic_variable;
///
/// let guid = resolve_dynamic_variable("guid").unwrap();
/// assert_eq!(guid.len(), 36);
///
/// assert!(resolve_dynamic_variable("nope").is_err());
/// ```
pub fn resolve_dynamic_variable(name: &str) -> Result<String, VarError> {
    match name {
        "timestamp" => Ok(resolve_timestamp()),
        "isoTimestamp" => Ok(resolve_iso_timestamp()),
        "randomInt" => Ok(resolve_random_int()),
        "guid" => Ok(resolve_guid()),
        _ => Err(VarError::UnknownDynamic {
            name: name.to_string(),
        }),
    }
}

/// Current Unix timestamp in seconds
fn resolve_timestamp() -> String {
    Utc::now().timestamp().to_string()
}

/// Current UTC time as ISO-8601 with millisecond precision, e.g. `2024-01-01T10:00:00.000Z`
fn resolve_iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Uniform integer in `0..=RANDOM_INT_MAX`
fn resolve_random_int() -> String {
    rand::thread_rng().gen_range(0..=RANDOM_INT_MAX).to_string()
}

/// Generates a new UUID v4
fn resolve_guid() -> String {
    Uuid::new_v4().to_string()
}

//! Merging of active profiles into the `profiles` variable layer.

use super::context::VariableMap;
use super::resolver::stringify;
use super::secrets::SecretRegistry;
use std::collections::HashMap;

/// Folds `names` left to right over `profiles`; later profiles override
/// earlier ones key by key. Unknown profile names are skipped.
///
/// With `verbose`, one `info` line per final key reports which profile the
/// winning value came from, with registered secrets masked.
///
/// # Examples
/// ```
/// use rest_chain::variables::{merge_profiles, SecretRegistry, VariableMap};
/// use serde_json::json;
/// use std::collections::HashMap;
///
/// let mut profiles: HashMap<String, VariableMap> = HashMap::new();
/// profiles.insert("base".into(), [("h".to_string(), json!(1)), ("x".to_string(), json!(1))].into());
/// profiles.insert("user".into(), [("h".to_string(), json!(2))].into());
///
/// let names = vec!["base".to_string(), "user".to_string()];
/// let merged = merge_profiles(&names, &profiles, false, &SecretRegistry::new());
/// assert_eq!(merged.get("h"), Some(&json!(2)));
/// assert_eq!(merged.get("x"), Some(&json!(1)));
/// ```
pub fn merge_profiles(
    names: &[String],
    profiles: &HashMap<String, VariableMap>,
    verbose: bool,
    secrets: &SecretRegistry,
) -> VariableMap {
    let mut merged = VariableMap::new();
    let mut origin: HashMap<&str, &str> = HashMap::new();

    for name in names {
        let Some(profile) = profiles.get(name) else {
            log::debug!("Skipping unknown profile '{}'", name);
            continue;
        };

        for (key, value) in profile {
            merged.insert(key.clone(), value.clone());
            origin.insert(key.as_str(), name.as_str());
        }
    }

    if verbose {
        let mut keys: Vec<&String> = merged.keys().collect();
        keys.sort();
        for key in keys {
            let value = secrets.mask(&stringify(&merged[key]));
            let from = origin.get(key.as_str()).copied().unwrap_or_default();
            log::info!("{}: {} (from {} profile)", key, value, from);
        }
    }

    merged
}

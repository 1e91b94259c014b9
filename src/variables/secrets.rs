//! Tracking of resolved secret values for output masking.
//!
//! Every value resolved through `{{secret.K}}` is registered under the key
//! `secret.K`. [`SecretRegistry::mask`] then replaces each literal occurrence
//! of any registered value with [`SECRET_PLACEHOLDER`].

use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Token substituted for secret values in masked output.
pub const SECRET_PLACEHOLDER: &str = "[SECRET]";

/// Registry of secret values resolved during one top-level invocation.
///
/// Cloning is cheap and clones share the same registry, so the resolver and
/// the chain engine see the same set of secrets.
#[derive(Debug, Clone, Default)]
pub struct SecretRegistry {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl SecretRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.values.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records `value` under `key`. Empty values are never registered.
    pub fn register(&self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        self.write().insert(key.into(), value);
    }

    /// Snapshot of every registered `secret.K → value` pair.
    pub fn secret_variables(&self) -> HashMap<String, String> {
        self.read().clone()
    }

    /// True if `value` is exactly one of the registered secrets.
    pub fn contains_value(&self, value: &str) -> bool {
        self.read().values().any(|v| v == value)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Forgets all registered secrets.
    pub fn reset(&self) {
        self.write().clear();
    }

    /// Replaces every literal occurrence of every registered secret in `text`.
    ///
    /// Longer secrets are matched first so a secret that contains another one
    /// is masked as a whole.
    pub fn mask(&self, text: &str) -> String {
        let mut secrets: Vec<String> = {
            let values = self.read();
            if values.is_empty() {
                return text.to_string();
            }
            values.values().cloned().collect()
        };
        secrets.sort_by_key(|s| std::cmp::Reverse(s.len()));
        secrets.dedup();

        let pattern = secrets
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");

        match Regex::new(&pattern) {
            Ok(re) => re.replace_all(text, SECRET_PLACEHOLDER).into_owned(),
            Err(e) => {
                // Only reachable if the combined pattern exceeds regex size limits.
                log::warn!("Secret masking pattern rejected ({}), masking literally", e);
                secrets
                    .iter()
                    .fold(text.to_string(), |acc, s| acc.replace(s.as_str(), SECRET_PLACEHOLDER))
            }
        }
    }
}

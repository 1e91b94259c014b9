//! Variable resolution for REST Chain
//!
//! This module resolves `{{...}}` expressions against the scoped variable
//! sources of a [`VariableContext`]: the unscoped precedence chain,
//! `profile.`, `api.`, `endpoint.`, `env.`, `secret.`, `plugins.`, `$` dynamic
//! generators and `steps.` back-references. Nested expressions are reduced
//! innermost-first by the [`VariableResolver`].

pub mod context;
pub mod dynamic;
pub mod error;
pub mod profiles;
pub mod resolver;
pub mod scanner;
pub mod scope;
pub mod secrets;
pub mod steps;

pub use context::{VariableContext, VariableMap, UNSCOPED_PRECEDENCE};
pub use dynamic::resolve_dynamic_variable;
pub use error::VarError;
pub use profiles::merge_profiles;
pub use resolver::{stringify, VariableResolver, MAX_RESOLUTION_ITERATIONS};
pub use scope::{classify, StepDataKind, VariableRef};
pub use secrets::{SecretRegistry, SECRET_PLACEHOLDER};

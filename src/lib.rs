//! REST Chain
//!
//! A configuration-driven HTTP request runner. APIs, endpoints, profiles and
//! multi-step chains are declared as data; every string in them may contain
//! `{{...}}` templates that are resolved right before a request is sent.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - **models**: Resolved HTTP requests and responses
//! - **config**: Project configuration model and runner settings
//! - **variables**: The variable resolution engine (scopes, nesting, secrets)
//! - **plugins**: Plugin-provided variable sources and request/response hooks
//! - **executor**: HTTP transport boundary and the reqwest transport
//! - **chain**: Sequential chain execution with step back-references
//! - **logging**: `env_logger` setup for diagnostic output
//!
//! # Variable Scopes
//!
//! | Expression | Source |
//! |------------|--------|
//! | `{{name}}` | cli → step `with` → chain `vars` → endpoint → api → profiles → global |
//! | `{{profile.K}}`, `{{api.K}}`, `{{endpoint.K}}` | that layer only |
//! | `{{env.K}}` | process environment |
//! | `{{secret.K}}` | process environment, masked in output |
//! | `{{plugins.P.F}}`, `{{plugins.P.F(a, b)}}` | plugin sources |
//! | `{{$guid}}`, `{{$timestamp}}`, `{{$isoTimestamp}}`, `{{$randomInt}}` | generated |
//! | `{{steps.ID.response.body.id}}` | earlier chain steps |
//!
//! Expressions nest: `{{steps.list.response.body.{{index}}.id}}` resolves
//! `index` first. A trailing `?` (`{{page?}}`) lets a header or query
//! parameter be dropped when the variable is undefined.
//!
//! # Example
//!
//! ```no_run
//! use rest_chain::chain::{ChainExecutor, ChainOptions};
//! use rest_chain::config::load_config;
//! use rest_chain::variables::VariableMap;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config(json!({
//!     "apis": {
//!         "users": {
//!             "baseUrl": "https://api.example.com",
//!             "endpoints": {
//!                 "create": { "method": "POST", "path": "/users", "body": { "name": "{{name}}" } },
//!                 "get": { "path": "/users/{id}" }
//!             }
//!         }
//!     },
//!     "chains": {
//!         "signup": {
//!             "vars": { "name": "Alice" },
//!             "steps": [
//!                 { "id": "create", "call": "users.create" },
//!                 { "id": "fetch", "call": "users.get",
//!                   "with": { "pathParams": { "id": "{{steps.create.response.body.id}}" } } }
//!             ]
//!         }
//!     }
//! }))?;
//!
//! let executor = ChainExecutor::from_config(&config)?;
//! let result = executor
//!     .execute_chain(
//!         "signup",
//!         &config.chains["signup"],
//!         &config,
//!         &VariableMap::new(),
//!         &VariableMap::new(),
//!         ChainOptions::default(),
//!     )
//!     .await;
//!
//! println!("{}", executor.resolver().mask_secrets(result.default_output().unwrap_or("")));
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod config;
pub mod executor;
pub mod logging;
pub mod models;
pub mod plugins;
pub mod variables;

pub use chain::{ChainError, ChainExecutor, ChainOptions, ChainResult, StepExecutionResult};
pub use config::{load_config, ProjectConfig};
pub use executor::{HttpTransport, ReqwestTransport};
pub use models::{HttpMethod, HttpRequest, HttpResponse};
pub use variables::{VarError, VariableContext, VariableResolver};

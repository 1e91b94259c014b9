//! Chain execution engine.
//!
//! A chain is an ordered list of endpoint calls. Each step is resolved with
//! a context that exposes the requests and responses of every earlier step
//! through `{{steps.ID.request...}}` and `{{steps.ID.response...}}`; the
//! first failing step halts the chain.

pub mod engine;
pub mod error;
pub mod policy;
pub mod request_builder;
pub mod result;

pub use engine::{ChainExecutor, ChainOptions};
pub use error::{ChainError, ChainLookupError};
pub use policy::{HttpErrorPolicy, PolicyError, StatusPattern};
pub use request_builder::{build_request, BuildError};
pub use result::{ChainResult, StepExecutionResult, STEP_FAILURE_STATUS};

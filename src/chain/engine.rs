//! Sequential chain runner.

use super::request_builder::{build_request, BuildError};
use super::{ChainError, ChainLookupError, ChainResult, StepExecutionResult};
use crate::config::{ChainDefinition, ChainStep, ProjectConfig};
use crate::executor::{ExecutionConfig, HttpTransport, ReqwestTransport, RequestError};
use crate::models::{HttpRequest, HttpResponse};
use crate::plugins::PluginRegistry;
use crate::variables::{VariableContext, VariableMap, VariableResolver};
use std::collections::HashMap;
use std::sync::Arc;

/// Run-time switches for chain and endpoint execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainOptions {
    /// Emit `[CHAIN]`/`[STEP]` progress lines at info level.
    pub verbose: bool,
    /// Build and echo every request, but never send it.
    pub dry_run: bool,
}

/// Runs chains and single endpoint calls against a transport.
#[derive(Clone)]
pub struct ChainExecutor {
    resolver: VariableResolver,
    transport: Arc<dyn HttpTransport>,
    plugins: PluginRegistry,
    env: HashMap<String, String>,
}

impl ChainExecutor {
    /// Creates an executor with a fresh resolver, no plugins and a snapshot
    /// of the process environment.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            resolver: VariableResolver::new(),
            transport,
            plugins: PluginRegistry::new(),
            env: std::env::vars().collect(),
        }
    }

    /// Creates an executor backed by reqwest, honoring the project's timeout
    /// and resolution limit.
    pub fn from_config(config: &ProjectConfig) -> Result<Self, RequestError> {
        let transport = ReqwestTransport::new(&ExecutionConfig::from_settings(&config.config))?;
        let resolver =
            VariableResolver::new().with_max_iterations(config.config.max_resolution_iterations);
        Ok(Self::new(Arc::new(transport)).with_resolver(resolver))
    }

    pub fn with_resolver(mut self, resolver: VariableResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_plugins(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = plugins;
        self
    }

    /// Replaces the environment snapshot used by `env.` and `secret.`.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn resolver(&self) -> &VariableResolver {
        &self.resolver
    }

    /// Runs the steps of `chain` in order, stopping at the first failure.
    ///
    /// Lookup, resolution, hook and transport failures stop the chain without
    /// recording the step. A response with status 400 or more is recorded and
    /// then stops the chain.
    pub async fn execute_chain(
        &self,
        chain_name: &str,
        chain: &ChainDefinition,
        config: &ProjectConfig,
        cli_vars: &VariableMap,
        profile_vars: &VariableMap,
        options: ChainOptions,
    ) -> ChainResult {
        let base = self.base_context(config, cli_vars, profile_vars);
        let total = chain.steps.len();
        // Step contexts share this history and are dropped before each push.
        let mut steps: Arc<Vec<StepExecutionResult>> = Arc::new(Vec::with_capacity(total));

        if options.verbose {
            self.info(&format!("[CHAIN] Starting chain '{}' ({} steps)", chain_name, total));
            if let Some(description) = &chain.description {
                self.info(&format!("[CHAIN] {}", description));
            }
        }

        for (index, step) in chain.steps.iter().enumerate() {
            if options.verbose {
                self.info(&format!(
                    "[STEP {}] Step {}/{}: {}",
                    step.id,
                    index + 1,
                    total,
                    step.description.as_deref().unwrap_or(&step.call)
                ));
            }

            let result = match self.run_step(step, chain, config, &base, &steps, options).await {
                Ok(result) => result,
                Err(failure) => return self.fail(chain_name, into_history(steps), failure),
            };

            if options.verbose {
                self.info(&format!(
                    "[STEP {}] Completed with {} {}",
                    step.id, result.response.status, result.response.status_text
                ));
            }

            let failure = (!result.success).then(|| ChainError::Http {
                step_id: step.id.clone(),
                status: result.response.status,
                status_text: result.response.status_text.clone(),
            });
            Arc::make_mut(&mut steps).push(result);

            if let Some(failure) = failure {
                return self.fail(chain_name, into_history(steps), failure);
            }
        }

        if options.verbose {
            self.info(&format!("[CHAIN] Chain '{}' completed successfully", chain_name));
        }
        ChainResult::succeeded(chain_name, into_history(steps))
    }

    /// Builds and runs a single `api.endpoint` call outside of any chain.
    ///
    /// Error statuses are returned as responses; only lookup, resolution,
    /// hook and transport failures are errors.
    pub async fn execute_endpoint(
        &self,
        api_name: &str,
        endpoint_name: &str,
        config: &ProjectConfig,
        cli_vars: &VariableMap,
        profile_vars: &VariableMap,
        options: ChainOptions,
    ) -> Result<(HttpRequest, HttpResponse), ChainError> {
        let label = format!("{}.{}", api_name, endpoint_name);
        let (api, endpoint) = lookup(config, api_name, endpoint_name)?;

        let mut ctx = self.base_context(config, cli_vars, profile_vars);
        ctx.endpoint = endpoint.variables.clone();
        ctx.api = api.variables.clone();

        let request = build_request(&self.resolver, api, endpoint, None, &ctx)
            .await
            .map_err(|e| build_failure(&label, e))?;

        self.dispatch(&label, request, options).await
    }

    async fn run_step(
        &self,
        step: &ChainStep,
        chain: &ChainDefinition,
        config: &ProjectConfig,
        base: &VariableContext,
        history: &Arc<Vec<StepExecutionResult>>,
        options: ChainOptions,
    ) -> Result<StepExecutionResult, ChainError> {
        let (api_name, endpoint_name) = step.target().ok_or_else(|| ChainLookupError::InvalidCall {
            call: step.call.clone(),
        })?;
        let (api, endpoint) = lookup(config, api_name, endpoint_name)?;
        let with = step.with.as_ref();

        let mut ctx = base.clone();
        ctx.step_with = with.map(|w| w.path_params.clone()).unwrap_or_default();
        ctx.chain_vars = chain.vars.clone();
        ctx.endpoint = endpoint.variables.clone();
        ctx.api = api.variables.clone();
        ctx.steps = Some(Arc::clone(history));

        let request = build_request(&self.resolver, api, endpoint, with, &ctx)
            .await
            .map_err(|e| build_failure(&step.id, e))?;

        let (request, response) = self.dispatch(&step.id, request, options).await?;
        Ok(StepExecutionResult::new(step.id.clone(), request, response))
    }

    /// Pre-request hooks, then either the dry-run stand-in or the transport
    /// followed by post-response hooks.
    async fn dispatch(
        &self,
        label: &str,
        request: HttpRequest,
        options: ChainOptions,
    ) -> Result<(HttpRequest, HttpResponse), ChainError> {
        let request = self
            .plugins
            .run_pre_request_hooks(request)
            .await
            .map_err(|source| ChainError::Hook {
                step_id: label.to_string(),
                source,
            })?;

        if options.dry_run {
            self.echo_dry_run(&request);
            return Ok((request, HttpResponse::dry_run()));
        }

        let response = self
            .transport
            .execute(&request)
            .await
            .map_err(|source| ChainError::Transport {
                step_id: label.to_string(),
                source,
            })?;

        let response = self
            .plugins
            .run_post_response_hooks(&request, response)
            .await
            .map_err(|source| ChainError::Hook {
                step_id: label.to_string(),
                source,
            })?;

        Ok((request, response))
    }

    fn base_context(
        &self,
        config: &ProjectConfig,
        cli_vars: &VariableMap,
        profile_vars: &VariableMap,
    ) -> VariableContext {
        VariableContext {
            cli: cli_vars.clone(),
            profiles: profile_vars.clone(),
            global_variables: config.variables.clone(),
            env: self.env.clone(),
            plugins: self.plugins.clone(),
            ..VariableContext::default()
        }
    }

    fn fail(&self, chain_name: &str, steps: Vec<StepExecutionResult>, failure: ChainError) -> ChainResult {
        let message = self.resolver.mask_secrets(&failure.to_string());
        log::debug!("Chain '{}' halted: {}", chain_name, message);
        ChainResult::failed(chain_name, steps, message, failure)
    }

    fn echo_dry_run(&self, request: &HttpRequest) {
        self.info(&format!("[DRY RUN] {} {}", request.method, request.url));
        for (name, value) in &request.headers {
            self.info(&format!("[DRY RUN] {}: {}", name, value));
        }
        if let Some(body) = &request.body {
            self.info(&format!("[DRY RUN] Body: {}", body));
        }
    }

    fn info(&self, line: &str) {
        log::info!("{}", self.resolver.mask_secrets(line));
    }
}

impl std::fmt::Debug for ChainExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainExecutor")
            .field("resolver", &self.resolver)
            .field("plugins", &self.plugins)
            .finish_non_exhaustive()
    }
}

fn lookup<'a>(
    config: &'a ProjectConfig,
    api_name: &str,
    endpoint_name: &str,
) -> Result<(&'a crate::config::ApiDefinition, &'a crate::config::EndpointDefinition), ChainLookupError>
{
    let api = config
        .apis
        .get(api_name)
        .ok_or_else(|| ChainLookupError::ApiNotFound {
            api: api_name.to_string(),
        })?;
    let endpoint = api
        .endpoints
        .get(endpoint_name)
        .ok_or_else(|| ChainLookupError::EndpointNotFound {
            api: api_name.to_string(),
            endpoint: endpoint_name.to_string(),
        })?;
    Ok((api, endpoint))
}

fn into_history(steps: Arc<Vec<StepExecutionResult>>) -> Vec<StepExecutionResult> {
    Arc::try_unwrap(steps).unwrap_or_else(|shared| shared.as_ref().clone())
}

fn build_failure(step_id: &str, error: BuildError) -> ChainError {
    match error {
        BuildError::Variable(source) => ChainError::Variable {
            step_id: step_id.to_string(),
            source,
        },
        BuildError::InvalidMethod(method) => ChainError::InvalidMethod {
            step_id: step_id.to_string(),
            method,
        },
    }
}

//! Variable resolution integration tests
//!
//! These tests exercise the public resolver API the way a CLI layer would:
//! layered contexts, nested expressions, profiles and secret masking.

use super::init_test_env;
use proptest::prelude::*;
use rest_chain::chain::StepExecutionResult;
use rest_chain::models::{HttpMethod, HttpRequest, HttpResponse};
use rest_chain::plugins::{Plugin, PluginError, PluginRegistry};
use rest_chain::variables::{
    VarError, VariableContext, VariableMap, VariableResolver, UNSCOPED_PRECEDENCE,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

fn layer_mut<'a>(ctx: &'a mut VariableContext, name: &str) -> &'a mut VariableMap {
    match name {
        "cli" => &mut ctx.cli,
        "stepWith" => &mut ctx.step_with,
        "chainVars" => &mut ctx.chain_vars,
        "endpoint" => &mut ctx.endpoint,
        "api" => &mut ctx.api,
        "profiles" => &mut ctx.profiles,
        _ => &mut ctx.global_variables,
    }
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

#[tokio::test]
async fn test_highest_layer_wins() {
    init_test_env();
    let resolver = VariableResolver::new();
    let mut ctx = VariableContext::new();
    ctx.cli.insert("k".to_string(), json!("a"));
    ctx.profiles.insert("k".to_string(), json!("b"));

    assert_eq!(resolver.resolve("{{k}}", &ctx).await.unwrap(), "a");
}

#[tokio::test]
async fn test_env_and_unscoped_are_separate() {
    init_test_env();
    let resolver = VariableResolver::new();
    let mut ctx = VariableContext::new();
    ctx.cli.insert("X".to_string(), json!("from-cli"));
    ctx.profiles.insert("Y".to_string(), json!("from-profile"));
    ctx.env.insert("Z".to_string(), "from-env".to_string());

    assert!(matches!(
        resolver.resolve("{{env.X}}", &ctx).await,
        Err(VarError::EnvNotDefined { .. })
    ));
    assert!(matches!(
        resolver.resolve("{{env.Y}}", &ctx).await,
        Err(VarError::EnvNotDefined { .. })
    ));
    assert!(matches!(
        resolver.resolve("{{Z}}", &ctx).await,
        Err(VarError::Undefined { .. })
    ));
    assert_eq!(resolver.resolve("{{env.Z}}", &ctx).await.unwrap(), "from-env");
}

#[tokio::test]
async fn test_nested_step_reference() {
    init_test_env();
    let resolver = VariableResolver::new();

    let mut response = HttpResponse::new(200, "OK");
    response.set_body(r#"[{"id":10},{"id":20}]"#);
    let request = HttpRequest::new(HttpMethod::GET, "https://api.example.com/items");

    let mut ctx = VariableContext::new();
    ctx.cli.insert("i".to_string(), json!("1"));
    ctx.steps = Some(Arc::new(vec![StepExecutionResult::new("s", request, response)]));

    assert_eq!(
        resolver
            .resolve("{{steps.s.response.body.{{i}}.id}}", &ctx)
            .await
            .unwrap(),
        "20"
    );
}

#[tokio::test]
async fn test_circular_definitions_are_rejected() {
    init_test_env();
    let resolver = VariableResolver::new();
    let mut ctx = VariableContext::new();
    ctx.chain_vars.insert("a".to_string(), json!("{{b}}"));
    ctx.chain_vars.insert("b".to_string(), json!("{{a}}"));

    let err = resolver.resolve("prefix {{a}} suffix", &ctx).await.unwrap_err();
    assert_eq!(err.to_string(), "Maximum variable resolution iterations reached");
}

#[tokio::test]
async fn test_merge_profiles_then_resolve() {
    init_test_env();
    let resolver = VariableResolver::new();
    let mut profiles: HashMap<String, VariableMap> = HashMap::new();
    profiles.insert(
        "base".to_string(),
        [("h".to_string(), json!(1)), ("x".to_string(), json!(1))].into(),
    );
    profiles.insert("user".to_string(), [("h".to_string(), json!(2))].into());

    let merged = resolver.merge_profiles(
        &["base".to_string(), "user".to_string(), "ghost".to_string()],
        &profiles,
        true,
    );
    let expected: VariableMap = [("h".to_string(), json!(2)), ("x".to_string(), json!(1))].into();
    assert_eq!(merged, expected);

    let ctx = VariableContext {
        profiles: merged,
        ..VariableContext::default()
    };
    assert_eq!(resolver.resolve("{{h}}-{{profile.x}}", &ctx).await.unwrap(), "2-1");
}

#[tokio::test]
async fn test_secret_masking_lifecycle() {
    init_test_env();
    let resolver = VariableResolver::new();
    let mut ctx = VariableContext::new();
    ctx.env.insert("PASSWORD".to_string(), "p@ss.w*rd(1)".to_string());
    ctx.env.insert("EMPTY".to_string(), String::new());

    let body = resolver
        .resolve(r#"{"password":"{{secret.PASSWORD}}","confirm":"{{secret.PASSWORD}}"}"#, &ctx)
        .await
        .unwrap();
    assert_eq!(
        resolver.mask_secrets(&body),
        r#"{"password":"[SECRET]","confirm":"[SECRET]"}"#
    );

    // Empty secrets resolve but are never tracked.
    assert_eq!(resolver.resolve("[{{secret.EMPTY}}]", &ctx).await.unwrap(), "[]");
    assert_eq!(resolver.secret_variables().len(), 1);

    resolver.reset_secret_tracking();
    assert_eq!(resolver.mask_secrets(&body), body);
}

#[tokio::test]
async fn test_async_plugin_sources() {
    init_test_env();
    struct Vault;

    #[async_trait::async_trait]
    impl rest_chain::plugins::ParameterizedSource for Vault {
        async fn call(&self, args: &[String]) -> Result<Value, PluginError> {
            tokio::task::yield_now().await;
            match args {
                [path] if path == "db/password" => Ok(json!("hunter2")),
                _ => Err(PluginError::new(format!("no secret at {:?}", args))),
            }
        }
    }

    let mut plugins = PluginRegistry::new();
    plugins.register(Plugin::new("vault").with_function("read", Vault));
    let ctx = VariableContext {
        plugins,
        cli: [("path".to_string(), json!("db/password"))].into(),
        ..VariableContext::default()
    };

    let resolver = VariableResolver::new();
    assert_eq!(
        resolver
            .resolve("{{plugins.vault.read({{path}})}}", &ctx)
            .await
            .unwrap(),
        "hunter2"
    );

    let err = resolver
        .resolve("{{plugins.vault.read(other)}}", &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, VarError::PluginFailed { .. }));
    assert_eq!(err.variable_name(), "plugins.vault.read(other)");
}

proptest! {
    #[test]
    fn prop_unscoped_precedence(present in proptest::collection::btree_set(0usize..7, 1..=7)) {
        let mut ctx = VariableContext::new();
        for &index in &present {
            let layer = UNSCOPED_PRECEDENCE[index];
            layer_mut(&mut ctx, layer).insert("key".to_string(), json!(layer));
        }

        let winner = UNSCOPED_PRECEDENCE[*present.iter().next().unwrap()];
        let resolved = block_on(VariableResolver::new().resolve("{{key}}", &ctx)).unwrap();
        prop_assert_eq!(resolved, winner);
    }
}

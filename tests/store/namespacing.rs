//! Namespace qualification and local contexts

use crate::common::*;
use statetree::{json, ActionDef, Call, CommitOptions, DispatchOptions, ModuleDefinition, Value};

fn tree() -> ModuleDefinition {
    ModuleDefinition::new()
        .state(json!({"n": 0}))
        .mutation("inc", |state, payload| add_to(state, "n", payload))
        .module("a", counter_module().namespaced())
        .module("plain", counter_module())
}

#[test]
fn qualified_type_hits_only_its_namespace() {
    let store = reporting_store(tree());
    store.commit("a/inc", json!(1));
    let state = store.state();
    assert_eq!(state["a"]["n"], 1);
    assert_eq!(state["n"], 0);
    assert_eq!(state["plain"]["n"], 0);
}

#[test]
fn bare_type_hits_only_unnamespaced_handlers() {
    let store = reporting_store(tree());
    store.commit("inc", json!(1));
    let state = store.state();
    assert_eq!(state["n"], 1);
    assert_eq!(state["plain"]["n"], 1);
    assert_eq!(state["a"]["n"], 0);
}

#[tokio::test]
async fn action_context_commits_locally() {
    let module = counter_module().namespaced().action(
        "bump",
        ActionDef::new(|ctx, payload| async move {
            ctx.commit("inc", payload);
            Ok(ctx.state())
        }),
    );
    let store = reporting_store(ModuleDefinition::new().module("a", module));
    let local_state = store.dispatch("a/bump", json!(3)).await.unwrap();
    assert_eq!(local_state, json!({"n": 3}));
}

#[tokio::test]
async fn root_option_escapes_namespace() {
    let module = ModuleDefinition::new().namespaced().action(
        "announce",
        ActionDef::new(|ctx, _| async move {
            ctx.commit_with(
                Call::new("inc", json!(5)),
                CommitOptions {
                    root: true,
                    ..CommitOptions::default()
                },
            );
            ctx.dispatch_with(Call::new("ping", Value::Null), DispatchOptions { root: true })
                .await
                .map_err(anyhow::Error::from)
        }),
    );
    let root = ModuleDefinition::new()
        .state(json!({"n": 0}))
        .mutation("inc", |state, payload| add_to(state, "n", payload))
        .action("ping", ActionDef::sync(|_, _| Ok(json!("pong"))))
        .module("a", module);
    let store = reporting_store(root);

    assert_eq!(store.dispatch("a/announce", Value::Null).await.unwrap(), json!("pong"));
    assert_eq!(store.state()["n"], 5);
}

#[tokio::test]
async fn root_action_registers_without_prefix() {
    let module = ModuleDefinition::new()
        .namespaced()
        .action("global", ActionDef::sync(|_, _| Ok(json!("from a"))).root());
    let store = reporting_store(ModuleDefinition::new().module("a", module));
    assert_eq!(store.dispatch("global", Value::Null).await.unwrap(), json!("from a"));
    assert!(store.dispatch("a/global", Value::Null).await.unwrap().is_null());
}

#[test]
fn local_getters_use_local_names() {
    let module = counter_module()
        .namespaced()
        .getter("double", |scope| json!(scope.state()["n"].as_i64().unwrap_or(0) * 2))
        .getter("quad", |scope| {
            json!(scope.getter("double").and_then(|v| v.as_i64()).unwrap_or(0) * 2)
        });
    let store = reporting_store(ModuleDefinition::new().module("a", module));
    store.commit("a/inc", json!(1));

    let ctx = store.local_context("a").unwrap();
    assert_eq!(ctx.getter("quad"), Some(json!(4)));
    assert_eq!(
        ctx.getters().keys().cloned().collect::<Vec<_>>(),
        vec!["double".to_string(), "quad".to_string()]
    );
    assert_eq!(store.getter("a/quad"), Some(json!(4)));
}

#[test]
fn nested_non_namespaced_module_inherits_parent_namespace() {
    let root = ModuleDefinition::new().module(
        "a",
        ModuleDefinition::new()
            .namespaced()
            .module("inner", counter_module()),
    );
    let store = reporting_store(root);
    store.commit("a/inc", json!(2));
    assert_eq!(store.state()["a"]["inner"]["n"], 2);
}

//! Hot update: handlers swap, state stays

use crate::common::*;
use statetree::{json, ActionDef, Diagnostic, ModuleDefinition, Value};

fn app() -> ModuleDefinition {
    ModuleDefinition::new()
        .state(json!({"n": 0}))
        .mutation("inc", |state, payload| add_to(state, "n", payload))
        .getter("n", |scope| scope.state()["n"].clone())
        .module("a", counter_module().namespaced())
        .module("b", counter_module().namespaced())
}

#[test]
fn new_mutation_becomes_committable() {
    let store = reporting_store(app());
    store.commit("reset", Value::Null);
    assert!(store
        .diagnostics()
        .any(|d| matches!(d, Diagnostic::UnknownMutation { kind } if kind == "reset")));

    store.commit("inc", json!(5));

    store.hot_update(
        ModuleDefinition::new().mutation("reset", |state, _| state["n"] = json!(0)),
    );
    store.commit("reset", Value::Null);
    assert_eq!(store.state()["n"], 0);
    assert_eq!(store.state_at("a"), Some(json!({"n": 0})));
}

#[test]
fn state_survives_hot_update() {
    let store = reporting_store(app());
    store.commit("inc", json!(3));
    store.commit("a/inc", json!(2));

    store.hot_update(ModuleDefinition::new().mutation("inc", |state, payload| {
        add_to(state, "n", &json!(payload.as_i64().unwrap_or(1) * 10))
    }));

    assert_eq!(store.state(), json!({"n": 3, "a": {"n": 2}, "b": {"n": 0}}));
    store.commit("inc", json!(1));
    assert_eq!(store.state()["n"], 13);
}

#[test]
fn modules_absent_from_update_keep_handlers() {
    let store = reporting_store(app());
    store.hot_update(
        ModuleDefinition::new().module(
            "a",
            ModuleDefinition::new()
                .namespaced()
                .mutation("inc", |state, _| add_to(state, "n", &json!(100))),
        ),
    );
    store.commit("a/inc", json!(1));
    store.commit("b/inc", json!(1));
    assert_eq!(store.state_at("a"), Some(json!({"n": 100})));
    assert_eq!(store.state_at("b"), Some(json!({"n": 1})));
}

#[test]
fn new_module_is_reported_and_not_created() {
    let store = reporting_store(app());
    store.hot_update(
        ModuleDefinition::new()
            .module("fresh", counter_module())
            .module("b", counter_module().namespaced().mutation("double", |state, _| {
                let n = state["n"].as_i64().unwrap_or(0);
                state["n"] = json!(n * 2);
            })),
    );

    assert!(!store.has_module("fresh"));
    assert_eq!(store.state_at("fresh"), None);
    assert!(store.diagnostics().any(
        |d| matches!(d, Diagnostic::NewModuleOnHotUpdate { key, .. } if key == "fresh")
    ));

    store.commit("b/inc", json!(4));
    store.commit("b/double", Value::Null);
    assert_eq!(store.state_at("b"), Some(json!({"n": 8})));
}

#[test]
fn updated_getters_are_recomputed() {
    let store = reporting_store(app());
    store.commit("inc", json!(2));
    assert_eq!(store.getter("n"), Some(json!(2)));

    store.hot_update(ModuleDefinition::new().getter("n", |scope| {
        json!(scope.state()["n"].as_i64().unwrap_or(0) + 100)
    }));
    assert_eq!(store.getter("n"), Some(json!(102)));
}

#[tokio::test]
async fn actions_are_swapped() {
    let root = app().action("hello", ActionDef::sync(|_, _| Ok(json!("old"))));
    let store = reporting_store(root);
    assert_eq!(store.dispatch("hello", Value::Null).await.unwrap(), json!("old"));

    store.hot_update(
        ModuleDefinition::new().action("hello", ActionDef::sync(|_, _| Ok(json!("new")))),
    );
    assert_eq!(store.dispatch("hello", Value::Null).await.unwrap(), json!("new"));
}

//! Strict mode: unguarded writes are flagged

use crate::common::*;
use statetree::{
    json, AssertionMode, Diagnostic, ModuleDefinition, RegisterOptions, Store, StoreConfig, Value,
    WatchOptions,
};

fn strict(assertions: AssertionMode) -> Store {
    init_tracing();
    Store::builder(counter_module().module("child", counter_module().namespaced()))
        .config(StoreConfig {
            strict: true,
            diagnostics: true,
            assertions,
            ..StoreConfig::default()
        })
        .build()
}

fn violations(store: &Store) -> usize {
    store
        .diagnostics()
        .snapshot()
        .iter()
        .filter(|d| matches!(d, Diagnostic::StrictModeViolation { .. }))
        .count()
}

#[test]
fn commits_and_store_operations_are_not_flagged() {
    let store = strict(AssertionMode::Report);
    store.commit("inc", Value::Null);
    store.commit("child/inc", Value::Null);
    store.replace_state(json!({"n": 1, "child": {"n": 1}}));
    store
        .register_module("late", counter_module(), RegisterOptions::default())
        .unwrap();
    store.unregister_module("late").unwrap();
    store.hot_update(ModuleDefinition::new());
    assert_eq!(violations(&store), 0);
    assert!(!store.is_committing());
}

#[test]
fn unguarded_write_is_reported_and_applied() {
    let store = strict(AssertionMode::Report);
    store.write_unguarded(|state| state["child"]["n"] = json!(42));
    assert_eq!(violations(&store), 1);
    assert_eq!(store.state_at("child"), Some(json!({"n": 42})));
}

#[test]
#[should_panic(expected = "do not mutate store state outside mutation handlers")]
fn unguarded_write_panics_when_assertions_panic() {
    let store = strict(AssertionMode::Panic);
    store.write_unguarded(|state| state["n"] = json!(-1));
}

#[test]
fn builder_override_enables_strict() {
    let store = Store::builder(counter_module())
        .config(reporting_config())
        .strict(true)
        .build();
    assert!(store.is_strict());
    store.write_unguarded(|state| state["n"] = json!(7));
    assert_eq!(violations(&store), 1);
}

#[test]
fn committing_flag_is_cleared_before_subscribers() {
    let seen = CallCounter::new();
    let counter = seen.clone();
    let store = strict(AssertionMode::Report);
    let handle = store.clone();
    store.subscribe(move |_, _| {
        if !handle.is_committing() {
            counter.hit();
        }
    });
    store.commit("inc", Value::Null);
    assert_eq!(seen.count(), 1);
    assert_eq!(violations(&store), 0);
}

#[test]
fn write_from_watch_callback_is_flagged() {
    let store = strict(AssertionMode::Report);
    let handle = store.clone();
    store.watch(
        |scope| scope.state()["n"].clone(),
        move |n, _| {
            let n = n.clone();
            handle.write_unguarded(|state| state["shadow"] = n);
        },
        WatchOptions::default(),
    );

    store.commit("inc", Value::Null);
    assert_eq!(store.state()["shadow"], 1);
    assert_eq!(violations(&store), 1);
    assert!(!store.is_committing());
}

#[test]
fn watch_callbacks_run_outside_the_commit_guard() {
    let store = strict(AssertionMode::Report);
    let inside = CallCounter::new();
    let counter = inside.clone();
    let handle = store.clone();
    store.watch(
        |scope| scope.state()["n"].clone(),
        move |_, _| {
            if handle.is_committing() {
                counter.hit();
            }
        },
        WatchOptions::default(),
    );
    store.commit("inc", Value::Null);
    store.replace_state(json!({"n": 5, "child": {"n": 0}}));
    assert_eq!(inside.count(), 0);
}

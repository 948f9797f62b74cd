//! Commit: handler fan-out, ordering, unknown types

use crate::common::*;
use statetree::{json, Call, CommitOptions, Diagnostic, ModuleDefinition, Value};

#[test]
fn all_handlers_run_once_in_order_before_subscribers() {
    let log = EventLog::new();
    let (first, second, third) = (log.clone(), log.clone(), log.clone());
    let root = ModuleDefinition::new()
        .mutation("go", move |_, _| first.push("root"))
        .module("a", ModuleDefinition::new().mutation("go", move |_, _| second.push("a")))
        .module("b", ModuleDefinition::new().mutation("go", move |_, _| third.push("b")));
    let store = reporting_store(root);

    let subscriber_log = log.clone();
    store.subscribe(move |_, _| subscriber_log.push("subscriber"));
    store.commit("go", Value::Null);

    assert_eq!(log.events(), vec!["root", "a", "b", "subscriber"]);
}

#[test]
fn object_style_call_carries_whole_object() {
    let root = ModuleDefinition::new()
        .state(json!({"seen": null}))
        .mutation("record", |state, payload| state["seen"] = payload.clone());
    let store = reporting_store(root);
    let call = Call::object(json!({"type": "record", "qty": 2})).unwrap();
    store.commit_with(call, CommitOptions::default());
    assert_eq!(store.state()["seen"]["qty"], 2);
    assert_eq!(store.state()["seen"]["type"], "record");
}

#[test]
fn object_style_call_requires_string_type() {
    let err = Call::object(json!({"type": 7})).unwrap_err();
    assert!(err.to_string().contains("expects string as the type"));
}

#[test]
fn unknown_type_changes_nothing() {
    let store = reporting_store(counter_module());
    let calls = CallCounter::new();
    let counter = calls.clone();
    store.subscribe(move |_, _| counter.hit());

    store.commit("nope", json!(1));
    assert_eq!(store.state(), json!({"n": 0}));
    assert_eq!(calls.count(), 0);
    assert!(store
        .diagnostics()
        .any(|d| matches!(d, Diagnostic::UnknownMutation { kind } if kind == "nope")));
}

#[test]
fn mutation_sees_only_local_state() {
    let root = ModuleDefinition::new()
        .state(json!({"top": true}))
        .module(
            "child",
            ModuleDefinition::new()
                .state(json!({"x": 0}))
                .mutation("inspect", |state, _| {
                    let keys = state.as_object().map_or(0, |fields| fields.len());
                    state["keys"] = json!(keys);
                }),
        );
    let store = reporting_store(root);
    store.commit("inspect", Value::Null);
    assert_eq!(store.state()["child"]["keys"], 1);
}

//! Getters: memoization, invalidation, resets

use crate::common::*;
use statetree::{json, ModuleDefinition, RegisterOptions, Value};

fn counted_total(calls: CallCounter) -> ModuleDefinition {
    counter_module().getter("total", move |scope| {
        calls.hit();
        scope.state()["n"].clone()
    })
}

#[test]
fn getter_recomputes_only_after_writes() {
    let calls = CallCounter::new();
    let store = reporting_store(counted_total(calls.clone()));

    assert_eq!(store.getter("total"), Some(json!(0)));
    assert_eq!(store.getter("total"), Some(json!(0)));
    assert_eq!(calls.count(), 1);

    store.commit("inc", json!(4));
    assert_eq!(store.getter("total"), Some(json!(4)));
    assert_eq!(calls.count(), 2);
}

#[test]
fn replace_state_invalidates_getters() {
    let calls = CallCounter::new();
    let store = reporting_store(counted_total(calls.clone()));
    store.getter("total");
    store.replace_state(json!({"n": 9}));
    assert_eq!(store.getter("total"), Some(json!(9)));
    assert_eq!(calls.count(), 2);
}

#[test]
fn registering_a_module_rebuilds_getters() {
    let calls = CallCounter::new();
    let store = reporting_store(counted_total(calls.clone()));
    store.getter("total");

    let extra = ModuleDefinition::new().getter("answer", |_| json!(42));
    store
        .register_module("extra", extra, RegisterOptions::default())
        .unwrap();

    assert_eq!(store.getter("answer"), Some(json!(42)));
    assert_eq!(store.getter("total"), Some(json!(0)));
    assert_eq!(calls.count(), 2);
}

#[test]
fn getters_listed_in_registration_order() {
    let root = ModuleDefinition::new()
        .getter("first", |_| json!(1))
        .module(
            "m",
            ModuleDefinition::new()
                .namespaced()
                .getter("second", |_| json!(2)),
        );
    let store = reporting_store(root);
    let all = store.getters();
    assert_eq!(
        all.keys().cloned().collect::<Vec<_>>(),
        vec!["first".to_string(), "m/second".to_string()]
    );
    assert_eq!(store.getter_names(), vec!["first", "m/second"]);
}

#[test]
fn getter_reads_root_state_and_root_getters() {
    let root = ModuleDefinition::new()
        .state(json!({"currency": "EUR"}))
        .getter("currency", |scope| scope.state()["currency"].clone())
        .module(
            "cart",
            ModuleDefinition::new()
                .namespaced()
                .state(json!({"amount": 5}))
                .getter("label", |scope| {
                    let currency = scope.root_getter("currency").unwrap_or(Value::Null);
                    json!(format!(
                        "{} {}",
                        scope.state()["amount"],
                        currency.as_str().unwrap_or("?")
                    ))
                }),
        );
    let store = reporting_store(root);
    assert_eq!(store.getter("cart/label"), Some(json!("5 EUR")));
}

#[test]
fn unknown_getter_is_none() {
    let store = reporting_store(counter_module());
    assert_eq!(store.getter("missing"), None);
}

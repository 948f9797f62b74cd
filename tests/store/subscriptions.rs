//! Mutation and action subscriptions, watches

use crate::common::*;
use parking_lot::Mutex;
use statetree::{
    json, ActionDef, ActionSubscriber, MutationRecord, MutationSubscriber, Subscription, Value,
    WatchOptions,
};
use std::sync::Arc;

#[test]
fn subscribers_run_in_subscription_order() {
    let store = reporting_store(counter_module());
    let log = EventLog::new();
    for tag in ["first", "second"] {
        let log = log.clone();
        store.subscribe(move |mutation, state| {
            log.push(format!("{} {} n={}", tag, mutation.kind, state["n"]))
        });
    }
    store.commit("inc", json!(2));
    assert_eq!(log.events(), vec!["first inc n=2", "second inc n=2"]);
}

#[test]
fn shared_subscriber_is_deduplicated() {
    let store = reporting_store(counter_module());
    let calls = CallCounter::new();
    let counter = calls.clone();
    let subscriber: MutationSubscriber =
        Arc::new(move |_: &MutationRecord, _: &Value| counter.hit());

    let handle = store.subscribe_shared(subscriber.clone());
    let again = store.subscribe_shared(subscriber);
    store.commit("inc", Value::Null);
    assert_eq!(calls.count(), 1);

    handle.unsubscribe();
    again.unsubscribe();
    store.commit("inc", Value::Null);
    assert_eq!(calls.count(), 1);
}

#[test]
fn unsubscribing_during_delivery_keeps_current_round() {
    let store = reporting_store(counter_module());
    let log = EventLog::new();
    let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

    let first_log = log.clone();
    let first_slot = slot.clone();
    let first = store.subscribe(move |_, _| {
        first_log.push("once");
        if let Some(subscription) = first_slot.lock().take() {
            subscription.unsubscribe();
        }
    });
    *slot.lock() = Some(first);

    let second_log = log.clone();
    store.subscribe(move |_, _| second_log.push("always"));

    store.commit("inc", Value::Null);
    store.commit("inc", Value::Null);
    assert_eq!(log.events(), vec!["once", "always", "always"]);
}

#[test]
fn subscription_outliving_store_is_harmless() {
    let store = reporting_store(counter_module());
    let subscription = store.subscribe(|_, _| {});
    drop(store);
    subscription.unsubscribe();
}

#[tokio::test]
async fn shared_action_subscriber_is_deduplicated() {
    let root = counter_module().action("noop", ActionDef::sync(|_, _| Ok(Value::Null)));
    let store = reporting_store(root);
    let calls = CallCounter::new();
    let counter = calls.clone();
    let subscriber = Arc::new(ActionSubscriber::after(move |_, _| {
        counter.hit();
        Ok(())
    }));

    let handle = store.subscribe_action_shared(subscriber.clone());
    store.subscribe_action_shared(subscriber);
    store.dispatch("noop", Value::Null).await.unwrap();
    assert_eq!(calls.count(), 1);

    handle.unsubscribe();
    store.dispatch("noop", Value::Null).await.unwrap();
    assert_eq!(calls.count(), 1);
}

#[test]
fn watch_fires_on_change_until_unwatched() {
    let store = reporting_store(counter_module());
    let log = EventLog::new();
    let sink = log.clone();
    let handle = store.watch(
        |scope| scope.state()["n"].clone(),
        move |new, old| sink.push(format!("{} -> {}", old, new)),
        WatchOptions { immediate: true },
    );

    store.commit("inc", json!(2));
    handle.unwatch();
    store.commit("inc", json!(2));
    assert_eq!(log.events(), vec!["null -> 0", "0 -> 2"]);
}

#[test]
fn watch_sees_replaced_state() {
    let store = reporting_store(counter_module());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    store.watch(
        |scope| scope.state()["n"].clone(),
        move |new, _| sink.lock().push(new.clone()),
        WatchOptions::default(),
    );
    store.replace_state(json!({"n": 10}));
    assert_eq!(*seen.lock(), vec![json!(10)]);
}

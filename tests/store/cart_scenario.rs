//! End-to-end: namespaced cart with actions, getters and subscribers

use crate::common::*;
use statetree::{
    json, ActionDef, Call, CommitOptions, DispatchOptions, ModuleDefinition, Value,
};

fn cart(total_calls: CallCounter) -> ModuleDefinition {
    ModuleDefinition::new()
        .namespaced()
        .state_with(|| json!({"items": []}))
        .mutation("addItem", |state, item| {
            if let Some(items) = state["items"].as_array_mut() {
                items.push(item.clone());
            }
        })
        .mutation("clear", |state, _| state["items"] = json!([]))
        .getter("total", move |scope| {
            total_calls.hit();
            let total: f64 = scope.state()["items"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .map(|item| {
                            item["price"].as_f64().unwrap_or(0.0)
                                * item["qty"].as_f64().unwrap_or(1.0)
                        })
                        .sum()
                })
                .unwrap_or(0.0);
            json!(total)
        })
        .getter("count", |scope| {
            json!(scope.state()["items"].as_array().map_or(0, Vec::len))
        })
        .action(
            "checkout",
            ActionDef::new(|ctx, _| async move {
                let total = ctx.getter("total").unwrap_or(Value::Null);
                ctx.commit("clear", Value::Null);
                ctx.dispatch_with(
                    Call::new("recordOrder", total.clone()),
                    DispatchOptions { root: true },
                )
                .await?;
                Ok(total)
            }),
        )
        .action(
            "recordOrder",
            ActionDef::root_scoped().handler(|ctx, total| async move {
                ctx.commit_with(
                    Call::new("orders/push", total),
                    CommitOptions {
                        root: true,
                        ..CommitOptions::default()
                    },
                );
                Ok(Value::Null)
            }),
        )
}

fn orders() -> ModuleDefinition {
    ModuleDefinition::new()
        .namespaced()
        .state(json!({"history": []}))
        .mutation("push", |state, total| {
            if let Some(history) = state["history"].as_array_mut() {
                history.push(total.clone());
            }
        })
}

fn shop(total_calls: CallCounter) -> ModuleDefinition {
    ModuleDefinition::new()
        .module("cart", cart(total_calls))
        .module("orders", orders())
}

#[test]
fn adding_items_updates_state_and_total() {
    let calls = CallCounter::new();
    let store = reporting_store(shop(calls.clone()));

    store.commit("cart/addItem", json!({"sku": "a", "price": 2.5, "qty": 2}));
    store.commit("cart/addItem", json!({"sku": "b", "price": 1.0, "qty": 3}));

    assert_eq!(store.state()["cart"]["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(store.getter("cart/total"), Some(json!(8.0)));
    assert_eq!(store.getter("cart/count"), Some(json!(2)));
    assert_eq!(store.getter("cart/total"), Some(json!(8.0)));
    assert_eq!(calls.count(), 1);
}

#[tokio::test]
async fn checkout_clears_cart_and_records_order() {
    let calls = CallCounter::new();
    let store = reporting_store(shop(calls));
    let log = EventLog::new();
    let sink = log.clone();
    store.subscribe(move |mutation, _| sink.push(mutation.kind.clone()));

    store.commit("cart/addItem", json!({"sku": "a", "price": 4.0, "qty": 1}));
    let total = store.dispatch("cart/checkout", Value::Null).await.unwrap();

    assert_eq!(total, json!(4.0));
    assert_eq!(store.state()["cart"]["items"], json!([]));
    assert_eq!(store.state()["orders"]["history"], json!([4.0]));
    assert_eq!(
        log.events(),
        vec!["cart/addItem", "cart/clear", "orders/push"]
    );
    assert!(store.diagnostics().snapshot().is_empty());
}

#[test]
fn local_context_reads_namespaced_view() {
    let store = reporting_store(shop(CallCounter::new()));
    let ctx = store.local_context("cart").unwrap();
    ctx.commit("addItem", json!({"price": 1.5}));

    assert_eq!(ctx.state()["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(ctx.getter("total"), Some(json!(1.5)));
    assert_eq!(
        ctx.getters().keys().cloned().collect::<Vec<_>>(),
        vec!["total".to_string(), "count".to_string()]
    );
    assert_eq!(ctx.root_state()["orders"]["history"], json!([]));
}

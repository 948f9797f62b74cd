//! Dispatch path
//!
//! ```text
//! dispatch(type, payload)
//!   ├─ before-subscribers (sync, errors reported and swallowed)
//!   ├─ call every handler for the type, in registration order
//!   ├─ one handler: its result; several: wait for all, then the values
//!   │  in order or the first failure
//!   └─ after-subscribers, with the state at settlement
//! ```
//!
//! Handler functions are called before `dispatch` returns, so an
//! `ActionDef::sync` action has already committed by then. The body of an
//! async action only runs while the returned [`Dispatch`] is polled: dropping
//! it unpolled skips that work along with the after-subscribers.
//!
//! A failing handler never cancels its siblings. The dispatch settles once
//! every handler has settled.

use super::context::LocalContext;
use super::registry::BoundAction;
use super::subscription::{ActionRecord, ActionSubscriber, Channel, Subscription};
use super::Store;
use crate::module::ActionFuture;
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use statetree_core::{Call, Diagnostic, DiagnosticSink, Result, StoreError, SubscriberPhase};
use std::sync::Arc;
use tracing::debug;

/// Pending result of a dispatch
pub type Dispatch = BoxFuture<'static, Result<Value>>;

pub(crate) fn resolved(value: Value) -> Dispatch {
    future::ready(Ok(value)).boxed()
}

impl Store {
    /// Dispatch an action
    ///
    /// The returned future must be awaited (or otherwise polled to completion)
    /// for async handlers to run.
    #[must_use = "async action handlers only run while the dispatch is polled"]
    pub fn dispatch(&self, kind: &str, payload: Value) -> Dispatch {
        self.dispatch_with(Call::new(kind, payload))
    }

    /// Dispatch a normalized call
    ///
    /// Resolves to the handler's value, or to an array of values when several
    /// handlers share the type. An unknown type is reported and resolves to
    /// `null`.
    ///
    /// # Errors
    ///
    /// `StoreError::ActionFailed` with the first failure in registration
    /// order, reported only after every handler has settled.
    #[must_use = "async action handlers only run while the dispatch is polled"]
    pub fn dispatch_with(&self, call: Call) -> Dispatch {
        let registry = self.inner.registry();
        let Some(handlers) = registry.actions.get(&call.kind) else {
            self.inner
                .diagnostics
                .report(Diagnostic::UnknownAction { kind: call.kind });
            return resolved(Value::Null);
        };

        let record = ActionRecord {
            kind: call.kind,
            payload: call.payload,
        };
        self.notify_action_subscribers(SubscriberPhase::BeforeAction, &record);

        let mut pending: Vec<ActionFuture> = handlers
            .iter()
            .map(|action| self.invoke(action, record.payload.clone()))
            .collect();
        debug!(target: "statetree::store", kind = %record.kind, handlers = pending.len(), "Action dispatched");

        let store = self.clone();
        async move {
            let outcome = if pending.len() > 1 {
                future::join_all(pending)
                    .await
                    .into_iter()
                    .collect::<anyhow::Result<Vec<Value>>>()
                    .map(Value::Array)
            } else {
                match pending.pop() {
                    Some(only) => only.await,
                    None => Ok(Value::Null),
                }
            };
            let value = outcome.map_err(|e| StoreError::action_failed(record.kind.as_str(), e))?;
            store.notify_action_subscribers(SubscriberPhase::AfterAction, &record);
            Ok(value)
        }
        .boxed()
    }

    fn invoke(&self, action: &BoundAction, payload: Value) -> ActionFuture {
        let context = LocalContext::new(self.clone(), action.scope.clone());
        let running = (action.handler)(context, payload);
        match &self.inner.error_hook {
            Some(hook) => {
                let hook = hook.clone();
                let kind = action.kind.clone();
                async move {
                    running.await.map_err(|e| {
                        hook.action_error(&kind, &e);
                        e
                    })
                }
                .boxed()
            }
            None => running,
        }
    }

    fn notify_action_subscribers(&self, phase: SubscriberPhase, record: &ActionRecord) {
        let subscribers = self.inner.action_subscribers.lock().snapshot();
        if subscribers.is_empty() {
            return;
        }
        let state = self.state();
        for subscriber in subscribers {
            let hook = match phase {
                SubscriberPhase::BeforeAction => subscriber.before.as_ref(),
                SubscriberPhase::AfterAction => subscriber.after.as_ref(),
            };
            let Some(hook) = hook else {
                continue;
            };
            if let Err(e) = hook(record, &state) {
                self.inner.diagnostics.report(Diagnostic::SubscriberFailed {
                    phase,
                    kind: record.kind.clone(),
                    message: format!("{:#}", e),
                });
            }
        }
    }

    /// Run `hook` before every dispatched action
    pub fn subscribe_action<F>(&self, hook: F) -> Subscription
    where
        F: Fn(&ActionRecord, &Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe_action_with(ActionSubscriber::before(hook))
    }

    /// Subscribe before and/or after hooks
    pub fn subscribe_action_with(&self, subscriber: ActionSubscriber) -> Subscription {
        self.subscribe_action_shared(Arc::new(subscriber))
    }

    /// Subscribe a shared action subscriber; subscribing the same one twice is a no-op
    pub fn subscribe_action_shared(&self, subscriber: Arc<ActionSubscriber>) -> Subscription {
        let id = self.inner.action_subscribers.lock().add(subscriber);
        Subscription::new(Arc::downgrade(&self.inner), Channel::Actions, id)
    }
}

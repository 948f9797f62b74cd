//! Commit path
//!
//! Every write to the root state goes through [`StoreInner::with_commit`]
//! and is announced as a guarded change once the flag is restored, except
//! [`Store::write_unguarded`], which exists to model writes that bypass it.

use super::subscription::{Channel, MutationRecord, Subscription};
use super::{CommitOptions, Store};
use serde_json::Value;
use statetree_core::{Call, ChangeKind, Diagnostic, DiagnosticSink, ModulePath, StateChange};
use std::sync::Arc;
use tracing::debug;

impl Store {
    /// Commit a mutation
    ///
    /// Every handler registered for `kind` runs, in registration order, before
    /// subscribers are notified. An unknown type is reported and ignored.
    pub fn commit(&self, kind: &str, payload: Value) {
        self.commit_with(Call::new(kind, payload), CommitOptions::default());
    }

    /// Commit a normalized call
    pub fn commit_with(&self, call: Call, options: CommitOptions) {
        let registry = self.inner.registry();
        let Some(handlers) = registry.mutations.get(&call.kind) else {
            self.inner
                .diagnostics
                .report(Diagnostic::UnknownMutation { kind: call.kind });
            return;
        };

        let unreachable: Vec<ModulePath> = self.inner.with_commit(|| {
            let mut state = self.inner.state.write();
            handlers
                .iter()
                .filter(|handler| !handler.apply(&mut state, &call.payload))
                .map(|handler| handler.path.clone())
                .collect()
        });
        self.inner
            .notify_guarded(StateChange::mutation(call.kind.as_str()));
        for path in unreachable {
            self.inner.diagnostics.report(Diagnostic::ModuleStateUnreachable {
                path,
                reason: format!("mutation {} skipped", call.kind),
            });
        }
        debug!(target: "statetree::store", kind = %call.kind, handlers = handlers.len(), "Mutation committed");

        let subscribers = self.inner.subscribers.lock().snapshot();
        if !subscribers.is_empty() {
            let record = MutationRecord {
                kind: call.kind.clone(),
                payload: call.payload,
            };
            let state = self.state();
            for subscriber in subscribers {
                subscriber(&record, &state);
            }
        }

        if options.silent {
            self.inner
                .diagnostics
                .report(Diagnostic::SilentOptionRemoved { kind: call.kind });
        }
    }

    /// Replace the whole root state as a guarded write
    pub fn replace_state(&self, state: Value) {
        self.inner.with_commit(|| *self.inner.state.write() = state);
        self.inner
            .notify_guarded(StateChange::whole(ChangeKind::Replace));
    }

    /// Write to the root state without going through a commit
    ///
    /// This is the path strict mode polices: with strict mode on, the write is
    /// reported as a violation.
    pub fn write_unguarded<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        let result = f(&mut self.inner.state.write());
        self.inner
            .reactivity
            .notify(&StateChange::whole(ChangeKind::Unguarded));
        result
    }

    /// Subscribe to committed mutations
    pub fn subscribe<F>(&self, subscriber: F) -> Subscription
    where
        F: Fn(&MutationRecord, &Value) + Send + Sync + 'static,
    {
        self.subscribe_shared(Arc::new(subscriber))
    }

    /// Subscribe a shared subscriber; subscribing the same one twice is a no-op
    pub fn subscribe_shared(
        &self,
        subscriber: Arc<dyn Fn(&MutationRecord, &Value) + Send + Sync>,
    ) -> Subscription {
        let id = self.inner.subscribers.lock().add(subscriber);
        Subscription::new(Arc::downgrade(&self.inner), Channel::Mutations, id)
    }
}

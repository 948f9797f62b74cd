//! Module-local context
//!
//! Action handlers receive a [`LocalContext`] scoped to the module they were
//! declared in. Inside a namespaced module:
//!
//! - `commit`/`dispatch` prefix the type with the module namespace, unless the
//!   `root` option is set
//! - `state()` is the module's own state, read when called
//! - `getter()`/`getters()` see the namespace's getters under local names
//!
//! Outside any namespace the context forwards to the store unchanged.

use super::getters::GetterGeneration;
use super::registry::LocalScope;
use super::{CommitOptions, Dispatch, DispatchOptions, Store};
use serde_json::{Map, Value};
use statetree_core::{get_nested, Call, Diagnostic, DiagnosticSink, ModulePath, Namespace};
use std::fmt;
use std::sync::Arc;

/// Context handed to action handlers
pub type ActionContext = LocalContext;

/// Namespace-scoped view of a store
#[derive(Clone)]
pub struct LocalContext {
    store: Store,
    scope: LocalScope,
}

impl LocalContext {
    pub(crate) fn new(store: Store, scope: LocalScope) -> Self {
        Self { store, scope }
    }

    /// The owning store
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Namespace this context qualifies types with
    pub fn namespace(&self) -> &Namespace {
        &self.scope.namespace
    }

    /// Module path this context reads state from
    pub fn path(&self) -> &ModulePath {
        &self.scope.path
    }

    /// Commit a local mutation
    pub fn commit(&self, kind: &str, payload: Value) {
        self.commit_with(Call::new(kind, payload), CommitOptions::default());
    }

    /// Commit with options; `root` skips namespace qualification
    pub fn commit_with(&self, call: Call, options: CommitOptions) {
        if self.scope.namespace.is_root() || options.root {
            return self.store.commit_with(call, options);
        }
        let global = self.scope.namespace.qualify(&call.kind);
        let diagnostics = &self.store.inner.diagnostics;
        if diagnostics.enabled() && !self.store.inner.registry().has_mutation(&global) {
            diagnostics.report(Diagnostic::UnknownLocalMutation {
                local: call.kind,
                global,
            });
            return;
        }
        self.store.commit_with(call.with_kind(global), options);
    }

    /// Dispatch a local action; the result must be awaited for async handlers to run
    #[must_use = "async action handlers only run while the dispatch is polled"]
    pub fn dispatch(&self, kind: &str, payload: Value) -> Dispatch {
        self.dispatch_with(Call::new(kind, payload), DispatchOptions::default())
    }

    /// Dispatch with options; `root` skips namespace qualification
    #[must_use = "async action handlers only run while the dispatch is polled"]
    pub fn dispatch_with(&self, call: Call, options: DispatchOptions) -> Dispatch {
        if self.scope.namespace.is_root() || options.root {
            return self.store.dispatch_with(call);
        }
        let global = self.scope.namespace.qualify(&call.kind);
        let diagnostics = &self.store.inner.diagnostics;
        if diagnostics.enabled() && !self.store.inner.registry().has_action(&global) {
            diagnostics.report(Diagnostic::UnknownLocalAction {
                local: call.kind,
                global,
            });
            return super::dispatch::resolved(Value::Null);
        }
        self.store.dispatch_with(call.with_kind(global))
    }

    /// Current module state, `null` if the module's state is unreachable
    pub fn state(&self) -> Value {
        self.store
            .inner
            .with_state(|root| get_nested(root, &self.scope.path).cloned())
            .unwrap_or(Value::Null)
    }

    /// Root state
    pub fn root_state(&self) -> Value {
        self.store.state()
    }

    /// Local getter by name
    pub fn getter(&self, local: &str) -> Option<Value> {
        self.store
            .inner
            .with_getters(|evaluator| evaluator.scope(&self.scope).getter(local))
    }

    /// All local getters, keyed by local name
    pub fn getters(&self) -> Map<String, Value> {
        self.store
            .inner
            .with_getters(|evaluator| evaluator.scope(&self.scope).getters())
    }

    /// Root getter by qualified type
    pub fn root_getter(&self, kind: &str) -> Option<Value> {
        self.store.getter(kind)
    }

    /// All root getters
    pub fn root_getters(&self) -> Map<String, Value> {
        self.store.getters()
    }

    /// Local getter names in registration order
    pub fn getter_names(&self) -> Vec<String> {
        let registry = self.store.inner.registry();
        if self.scope.namespace.is_root() {
            return registry.getter_types().map(str::to_string).collect();
        }
        let generation: Arc<GetterGeneration> = self.store.inner.getters.current();
        generation
            .local_entries(&registry, &self.scope.namespace)
            .iter()
            .map(|(local, _)| local.clone())
            .collect()
    }
}

impl fmt::Debug for LocalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalContext")
            .field("namespace", &self.scope.namespace)
            .field("path", &self.scope.path)
            .finish()
    }
}

//! Getter evaluation and memoization
//!
//! Getters are derived values cached per reactivity epoch. A cached value is
//! served while the engine's epoch is unchanged since it was computed; any
//! state write advances the epoch and the next read recomputes.
//!
//! ## Generations
//!
//! Every reset installs a fresh [`GetterGeneration`]: an empty value cache
//! plus an empty per-namespace structure cache for local getter views. The
//! superseded generation is handed to the reactivity engine's `next_tick`
//! and released there.

use super::registry::{LocalScope, Registry};
use super::StoreInner;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use statetree_core::{get_nested, Namespace};
use std::sync::Arc;

static NULL: Value = Value::Null;

/// Cached values and local-view structure for one installed registry
#[derive(Default)]
pub(crate) struct GetterGeneration {
    values: Mutex<FxHashMap<String, (u64, Value)>>,
    locals: Mutex<FxHashMap<Namespace, Arc<Vec<(String, String)>>>>,
}

impl GetterGeneration {
    fn cached(&self, kind: &str, epoch: u64) -> Option<Value> {
        match self.values.lock().get(kind) {
            Some((at, value)) if *at == epoch => Some(value.clone()),
            _ => None,
        }
    }

    fn store(&self, kind: &str, epoch: u64, value: Value) {
        self.values.lock().insert(kind.to_string(), (epoch, value));
    }

    /// `(local, qualified)` pairs of the getters visible under `namespace`
    ///
    /// Built on first use and reused until the next reset.
    pub fn local_entries(
        &self,
        registry: &Registry,
        namespace: &Namespace,
    ) -> Arc<Vec<(String, String)>> {
        if let Some(entries) = self.locals.lock().get(namespace) {
            return entries.clone();
        }
        let entries: Arc<Vec<(String, String)>> = Arc::new(
            registry
                .getter_types()
                .filter_map(|kind| {
                    namespace
                        .localize(kind)
                        .map(|local| (local.to_string(), kind.to_string()))
                })
                .collect(),
        );
        self.locals
            .lock()
            .insert(namespace.clone(), entries.clone());
        entries
    }

    #[cfg(test)]
    pub fn cached_len(&self) -> usize {
        self.values.lock().len()
    }
}

/// Slot holding the current generation
#[derive(Default)]
pub(crate) struct GetterCache {
    current: RwLock<Arc<GetterGeneration>>,
}

impl GetterCache {
    pub fn current(&self) -> Arc<GetterGeneration> {
        self.current.read().clone()
    }

    /// Install an empty generation, returning the superseded one
    pub fn renew(&self) -> Arc<GetterGeneration> {
        std::mem::take(&mut *self.current.write())
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// One consistent view for resolving getters: registry snapshot, root state
/// and epoch, all captured while the state read lock is held.
pub(crate) struct GetterEvaluator<'a> {
    pub registry: &'a Registry,
    pub root: &'a Value,
    pub generation: &'a GetterGeneration,
    pub epoch: u64,
}

impl<'a> GetterEvaluator<'a> {
    /// Resolve a qualified getter type, serving the memoized value if current
    pub fn resolve(&self, kind: &str) -> Option<Value> {
        if let Some(value) = self.generation.cached(kind, self.epoch) {
            return Some(value);
        }
        let getter = self.registry.getter(kind)?;
        let value = (getter.handler)(&self.scope(&getter.scope));
        self.generation.store(kind, self.epoch, value.clone());
        Some(value)
    }

    /// Scope seen by a getter registered in `scope`
    pub fn scope<'s>(&'s self, scope: &'s LocalScope) -> GetterScope<'s> {
        GetterScope {
            state: get_nested(self.root, &scope.path).unwrap_or(&NULL),
            root_state: self.root,
            namespace: &scope.namespace,
            evaluator: self,
        }
    }

    /// All root getters, in registration order
    pub fn all(&self) -> Map<String, Value> {
        self.registry
            .getter_types()
            .filter_map(|kind| self.resolve(kind).map(|value| (kind.to_string(), value)))
            .collect()
    }

    /// Getters local to `namespace`, keyed by local name
    pub fn local(&self, namespace: &Namespace) -> Map<String, Value> {
        self.generation
            .local_entries(self.registry, namespace)
            .iter()
            .filter_map(|(local, qualified)| {
                self.resolve(qualified).map(|value| (local.clone(), value))
            })
            .collect()
    }
}

/// What a getter (or a `watch` expression) can read
///
/// `state()` is the state of the module the getter belongs to; `getter()`
/// resolves names local to its namespace. The root variants see the whole
/// store.
pub struct GetterScope<'a> {
    state: &'a Value,
    root_state: &'a Value,
    namespace: &'a Namespace,
    evaluator: &'a GetterEvaluator<'a>,
}

impl<'a> GetterScope<'a> {
    /// Local module state
    pub fn state(&self) -> &Value {
        self.state
    }

    /// Root state
    pub fn root_state(&self) -> &Value {
        self.root_state
    }

    /// Namespace the getter was registered under
    pub fn namespace(&self) -> &Namespace {
        self.namespace
    }

    /// Local getter by name
    pub fn getter(&self, local: &str) -> Option<Value> {
        if self.namespace.is_root() {
            return self.evaluator.resolve(local);
        }
        let entries = self
            .evaluator
            .generation
            .local_entries(self.evaluator.registry, self.namespace);
        let (_, qualified) = entries.iter().find(|(name, _)| name == local)?;
        self.evaluator.resolve(qualified)
    }

    /// All local getters, keyed by local name
    pub fn getters(&self) -> Map<String, Value> {
        if self.namespace.is_root() {
            self.evaluator.all()
        } else {
            self.evaluator.local(self.namespace)
        }
    }

    /// Root getter by qualified type
    pub fn root_getter(&self, kind: &str) -> Option<Value> {
        self.evaluator.resolve(kind)
    }

    /// All root getters, keyed by qualified type
    pub fn root_getters(&self) -> Map<String, Value> {
        self.evaluator.all()
    }
}

impl StoreInner {
    /// Run `f` against a consistent getter view
    pub(crate) fn with_getters<R>(&self, f: impl FnOnce(&GetterEvaluator<'_>) -> R) -> R {
        let registry = self.registry();
        let generation = self.getters.current();
        let state = self.state.read_recursive();
        let evaluator = GetterEvaluator {
            registry: &registry,
            root: &state,
            generation: &generation,
            epoch: self.reactivity.epoch(),
        };
        f(&evaluator)
    }

    /// Evaluate `f` in the root getter scope
    pub(crate) fn evaluate_root<R>(&self, f: impl FnOnce(&GetterScope<'_>) -> R) -> R {
        let root = LocalScope::root();
        self.with_getters(|evaluator| f(&evaluator.scope(&root)))
    }
}

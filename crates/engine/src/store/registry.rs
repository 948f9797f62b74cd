//! Flattened handler registries
//!
//! The module tree is walked once per install into a [`Registry`]: mutation and
//! action lists keyed by qualified type, at most one getter per type, the
//! namespace map, and the local scope of every installed module.
//!
//! A registry is immutable once built. Resets build a fresh one and swap it
//! in, so calls in flight keep the snapshot they started with.

use crate::module::{ActionFn, GetterFn, MutationFn};
use rustc_hash::FxHashMap;
use serde_json::Value;
use statetree_core::{get_nested_mut, ModulePath, Namespace};

/// Where a handler runs: its module path and namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocalScope {
    pub namespace: Namespace,
    pub path: ModulePath,
}

impl LocalScope {
    pub fn root() -> Self {
        Self {
            namespace: Namespace::root(),
            path: ModulePath::root(),
        }
    }
}

/// Mutation handler bound to its module's state path
#[derive(Clone)]
pub(crate) struct BoundMutation {
    pub path: ModulePath,
    pub handler: MutationFn,
}

impl BoundMutation {
    /// Run against the local state under `root`; false if the state is unreachable
    pub fn apply(&self, root: &mut Value, payload: &Value) -> bool {
        match get_nested_mut(root, &self.path) {
            Some(local) => {
                (self.handler)(local, payload);
                true
            }
            None => false,
        }
    }
}

/// Action handler bound to its module's scope
#[derive(Clone)]
pub(crate) struct BoundAction {
    pub kind: String,
    pub scope: LocalScope,
    pub handler: ActionFn,
}

/// Getter bound to its module's scope
#[derive(Clone)]
pub(crate) struct BoundGetter {
    pub scope: LocalScope,
    pub handler: GetterFn,
}

#[derive(Default)]
pub(crate) struct Registry {
    pub mutations: FxHashMap<String, Vec<BoundMutation>>,
    pub actions: FxHashMap<String, Vec<BoundAction>>,
    getters: FxHashMap<String, BoundGetter>,
    getter_order: Vec<String>,
    pub namespaces: FxHashMap<Namespace, ModulePath>,
    pub scopes: FxHashMap<ModulePath, LocalScope>,
}

impl Registry {
    pub fn add_mutation(&mut self, kind: String, mutation: BoundMutation) {
        self.mutations.entry(kind).or_default().push(mutation);
    }

    pub fn add_action(&mut self, action: BoundAction) {
        self.actions
            .entry(action.kind.clone())
            .or_default()
            .push(action);
    }

    /// Register a getter; returns false (and keeps the first) on a duplicate type
    pub fn add_getter(&mut self, kind: String, getter: BoundGetter) -> bool {
        if self.getters.contains_key(&kind) {
            return false;
        }
        self.getter_order.push(kind.clone());
        self.getters.insert(kind, getter);
        true
    }

    pub fn getter(&self, kind: &str) -> Option<&BoundGetter> {
        self.getters.get(kind)
    }

    pub fn has_mutation(&self, kind: &str) -> bool {
        self.mutations.contains_key(kind)
    }

    pub fn has_action(&self, kind: &str) -> bool {
        self.actions.contains_key(kind)
    }

    /// Getter types in registration order
    pub fn getter_types(&self) -> impl Iterator<Item = &str> {
        self.getter_order.iter().map(String::as_str)
    }
}

//! Runtime module node
//!
//! A [`Module`] is the live counterpart of a [`ModuleDefinition`]: it owns the
//! materialized initial state, the handler tables and its children. Child
//! order follows registration order.

use super::definition::{ActionDef, GetterFn, ModuleDefinition, MutationFn, NamedMap};
use serde_json::Value;
use std::fmt;

/// Node of the module tree
pub struct Module {
    runtime: bool,
    namespaced: bool,
    state: Value,
    mutations: Option<NamedMap<MutationFn>>,
    actions: Option<NamedMap<ActionDef>>,
    getters: Option<NamedMap<GetterFn>>,
    children: NamedMap<Module>,
}

impl Module {
    /// Build a node from `definition` without its nested modules
    ///
    /// The state initializer runs once here.
    pub fn new(definition: &ModuleDefinition, runtime: bool) -> Self {
        Self {
            runtime,
            namespaced: definition.namespaced,
            state: definition.initial_state(),
            mutations: definition.mutations.clone(),
            actions: definition.actions.clone(),
            getters: definition.getters.clone(),
            children: NamedMap::new(),
        }
    }

    /// Registered after store construction
    pub fn is_runtime(&self) -> bool {
        self.runtime
    }

    /// Contributes its name to the namespace
    pub fn is_namespaced(&self) -> bool {
        self.namespaced
    }

    /// State materialized at construction
    pub fn state(&self) -> &Value {
        &self.state
    }

    /// Attach `child` as `name`, replacing any existing child
    pub fn add_child(&mut self, name: impl Into<String>, child: Module) -> Option<Module> {
        self.children.insert(name, child)
    }

    /// Detach child `name`
    pub fn remove_child(&mut self, name: &str) -> Option<Module> {
        self.children.remove(name)
    }

    /// Child `name`
    pub fn child(&self, name: &str) -> Option<&Module> {
        self.children.get(name)
    }

    /// Child `name`, mutably
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Module> {
        self.children.get_mut(name)
    }

    /// Children in registration order
    pub fn children(&self) -> impl Iterator<Item = (&str, &Module)> {
        self.children.iter()
    }

    /// Number of modules in this subtree, including this one
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|(_, child)| child.subtree_len())
            .sum::<usize>()
    }

    /// Mutation handlers in declaration order
    pub fn mutations(&self) -> impl Iterator<Item = (&str, &MutationFn)> {
        self.mutations.iter().flat_map(NamedMap::iter)
    }

    /// Actions in declaration order
    pub fn actions(&self) -> impl Iterator<Item = (&str, &ActionDef)> {
        self.actions.iter().flat_map(NamedMap::iter)
    }

    /// Getters in declaration order
    pub fn getters(&self) -> impl Iterator<Item = (&str, &GetterFn)> {
        self.getters.iter().flat_map(NamedMap::iter)
    }

    /// Partial in-place update from a new definition
    ///
    /// The namespaced flag is always taken from `definition`; each handler table
    /// is replaced only if `definition` declares it. State and children are
    /// left alone.
    pub fn update(&mut self, definition: &ModuleDefinition) {
        self.namespaced = definition.namespaced;
        if let Some(mutations) = &definition.mutations {
            self.mutations = Some(mutations.clone());
        }
        if let Some(actions) = &definition.actions {
            self.actions = Some(actions.clone());
        }
        if let Some(getters) = &definition.getters {
            self.getters = Some(getters.clone());
        }
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("runtime", &self.runtime)
            .field("namespaced", &self.namespaced)
            .field("state", &self.state)
            .field("mutations", &self.mutations)
            .field("actions", &self.actions)
            .field("getters", &self.getters)
            .field("children", &self.children)
            .finish()
    }
}

//! Raw module definitions
//!
//! A [`ModuleDefinition`] is what callers hand to the store: a state initializer,
//! the `namespaced` flag, three handler tables and nested definitions. It is
//! built fluently and is cheap to clone (handlers are reference counted).
//!
//! ## Handler signatures
//!
//! | Kind | Signature |
//! |------|-----------|
//! | mutation | `Fn(&mut Value, &Value)`: local state, payload |
//! | action | `Fn(ActionContext, Value) -> ActionFuture` |
//! | getter | `Fn(&GetterScope) -> Value` |
//!
//! Mutation and getter arity is fixed by these types. Actions also have an
//! object form (`ActionDef::root_scoped()`) whose handler is attached separately;
//! an object form left without a handler is reported at registration.
//!
//! ## Absent vs empty
//!
//! A handler table that was never touched is *absent*. Hot updates only
//! replace tables that are present in the new definition.

use crate::store::{ActionContext, GetterScope};
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use statetree_core::empty_state;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Mutation handler: `(local_state, payload)`
pub type MutationFn = Arc<dyn Fn(&mut Value, &Value) + Send + Sync>;

/// Getter handler evaluated against a [`GetterScope`]
pub type GetterFn = Arc<dyn Fn(&GetterScope<'_>) -> Value + Send + Sync>;

/// Deferred result of an action handler
pub type ActionFuture = BoxFuture<'static, anyhow::Result<Value>>;

/// Action handler: `(context, payload) -> deferred result`
pub type ActionFn = Arc<dyn Fn(ActionContext, Value) -> ActionFuture + Send + Sync>;

/// State producer invoked once when a module is constructed
pub type StateFn = Arc<dyn Fn() -> Value + Send + Sync>;

// =============================================================================
// NamedMap
// =============================================================================

/// Insertion-ordered name → entry table
///
/// Inserting an existing name replaces the entry in place (last write wins).
#[derive(Clone)]
pub struct NamedMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> NamedMap<T> {
    /// Empty table
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace `name`, returning the replaced entry
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> Option<T> {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Remove `name`
    pub fn remove(&mut self, name: &str) -> Option<T> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Look up `name`
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Look up `name` mutably
    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// True if `name` is present
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Mutable entries in insertion order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut T)> {
        self.entries
            .iter_mut()
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for NamedMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for NamedMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

// =============================================================================
// State initializer
// =============================================================================

/// Module state initializer: a value, or a producer called once per module instance
#[derive(Clone)]
pub enum StateInit {
    /// Literal state
    Value(Value),
    /// Zero-argument producer
    Producer(StateFn),
}

impl StateInit {
    /// Materialize the state; `null` becomes an empty object
    pub fn materialize(&self) -> Value {
        let state = match self {
            StateInit::Value(value) => value.clone(),
            StateInit::Producer(produce) => produce(),
        };
        if state.is_null() {
            empty_state()
        } else {
            state
        }
    }
}

impl fmt::Debug for StateInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateInit::Value(value) => f.debug_tuple("Value").field(value).finish(),
            StateInit::Producer(_) => f.write_str("Producer"),
        }
    }
}

// =============================================================================
// ActionDef
// =============================================================================

/// An action entry: handler plus root-scope flag
#[derive(Clone, Default)]
pub struct ActionDef {
    handler: Option<ActionFn>,
    root: bool,
}

impl ActionDef {
    /// Asynchronous handler
    ///
    /// ```ignore
    /// ActionDef::new(|ctx, payload| async move {
    ///     ctx.commit("setUser", payload);
    ///     Ok(Value::Null)
    /// })
    /// ```
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(ActionContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self {
            handler: Some(wrap_async(handler)),
            root: false,
        }
    }

    /// Synchronous handler; its result is wrapped into a ready future
    pub fn sync<F>(handler: F) -> Self
    where
        F: Fn(ActionContext, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            handler: Some(wrap_sync(handler)),
            root: false,
        }
    }

    /// Object form registered under its bare name, handler attached with [`handler`](Self::handler)
    pub fn root_scoped() -> Self {
        Self {
            handler: None,
            root: true,
        }
    }

    /// Opt out of namespace qualification
    pub fn root(mut self) -> Self {
        self.root = true;
        self
    }

    /// Attach or replace the asynchronous handler
    pub fn handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(ActionContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.handler = Some(wrap_async(handler));
        self
    }

    /// True if registered under its bare name
    pub fn is_root(&self) -> bool {
        self.root
    }

    /// The handler, if one was attached
    pub fn handler_fn(&self) -> Option<&ActionFn> {
        self.handler.as_ref()
    }
}

impl fmt::Debug for ActionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDef")
            .field("handler", &self.handler.is_some())
            .field("root", &self.root)
            .finish()
    }
}

fn wrap_async<F, Fut>(handler: F) -> ActionFn
where
    F: Fn(ActionContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(move |ctx: ActionContext, payload: Value| -> ActionFuture {
        handler(ctx, payload).boxed()
    })
}

fn wrap_sync<F>(handler: F) -> ActionFn
where
    F: Fn(ActionContext, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    Arc::new(move |ctx: ActionContext, payload: Value| -> ActionFuture {
        future::ready(handler(ctx, payload)).boxed()
    })
}

// =============================================================================
// ModuleDefinition
// =============================================================================

/// Raw definition of a module and its nested modules
///
/// # Example
///
/// ```ignore
/// let cart = ModuleDefinition::new()
///     .namespaced()
///     .state(json!({"items": []}))
///     .mutation("addItem", |state, item| {
///         if let Some(items) = state["items"].as_array_mut() {
///             items.push(item.clone());
///         }
///     })
///     .getter("count", |scope| json!(scope.state()["items"].as_array().map_or(0, Vec::len)));
/// ```
#[derive(Clone, Default)]
pub struct ModuleDefinition {
    pub(crate) state: Option<StateInit>,
    pub(crate) namespaced: bool,
    pub(crate) mutations: Option<NamedMap<MutationFn>>,
    pub(crate) actions: Option<NamedMap<ActionDef>>,
    pub(crate) getters: Option<NamedMap<GetterFn>>,
    pub(crate) modules: Option<NamedMap<ModuleDefinition>>,
}

impl ModuleDefinition {
    /// Empty definition: empty state, not namespaced, no handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Literal initial state
    pub fn state(mut self, state: Value) -> Self {
        self.state = Some(StateInit::Value(state));
        self
    }

    /// State producer, called once for every module built from this definition
    pub fn state_with<F>(mut self, produce: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.state = Some(StateInit::Producer(Arc::new(produce)));
        self
    }

    /// Declare the module namespaced
    pub fn namespaced(mut self) -> Self {
        self.namespaced = true;
        self
    }

    /// Set the namespaced flag explicitly
    pub fn set_namespaced(mut self, namespaced: bool) -> Self {
        self.namespaced = namespaced;
        self
    }

    /// Add a mutation handler
    pub fn mutation<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Value, &Value) + Send + Sync + 'static,
    {
        self.mutations
            .get_or_insert_with(NamedMap::new)
            .insert(name, Arc::new(handler) as MutationFn);
        self
    }

    /// Add an action
    pub fn action(mut self, name: impl Into<String>, action: ActionDef) -> Self {
        self.actions
            .get_or_insert_with(NamedMap::new)
            .insert(name, action);
        self
    }

    /// Add a getter
    pub fn getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&GetterScope<'_>) -> Value + Send + Sync + 'static,
    {
        self.getters
            .get_or_insert_with(NamedMap::new)
            .insert(name, Arc::new(getter) as GetterFn);
        self
    }

    /// Add a nested module
    pub fn module(mut self, name: impl Into<String>, definition: ModuleDefinition) -> Self {
        self.modules
            .get_or_insert_with(NamedMap::new)
            .insert(name, definition);
        self
    }

    /// Whether the definition declares itself namespaced
    pub fn is_namespaced(&self) -> bool {
        self.namespaced
    }

    /// Nested definitions, if any were declared
    pub fn modules(&self) -> Option<&NamedMap<ModuleDefinition>> {
        self.modules.as_ref()
    }

    /// Actions, if any were declared
    pub fn actions(&self) -> Option<&NamedMap<ActionDef>> {
        self.actions.as_ref()
    }

    /// Materialize the initial state
    pub fn initial_state(&self) -> Value {
        self.state
            .as_ref()
            .map_or_else(empty_state, StateInit::materialize)
    }
}

impl fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("state", &self.state)
            .field("namespaced", &self.namespaced)
            .field("mutations", &self.mutations)
            .field("actions", &self.actions)
            .field("getters", &self.getters)
            .field("modules", &self.modules)
            .finish()
    }
}

//! The store
//!
//! A [`Store`] owns the module tree, the root state and the flattened handler
//! registries built from the tree. It is a cheap, clonable handle.
//!
//! ## Call flow
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | `commit` | runs every mutation handler for the type inside a guarded commit, then notifies subscribers |
//! | `dispatch` | runs before-subscribers, starts every action handler, joins them, runs after-subscribers |
//! | `register_module` / `unregister_module` | edits the tree and state, then rebuilds the registries |
//! | `hot_update` | swaps handlers in place and rebuilds the registries, keeping state |
//!
//! ## Locking
//!
//! No lock is held while user code runs, except for the state write lock
//! around mutation handlers. Registries are immutable snapshots swapped on
//! reset, so a call in flight always sees one consistent registry.

mod commit;
mod context;
mod dispatch;
mod getters;
mod install;
mod registry;
mod strict;
mod subscription;
mod watch;

pub use context::{ActionContext, LocalContext};
pub use dispatch::Dispatch;
pub use getters::GetterScope;
pub use subscription::{
    ActionHook, ActionRecord, ActionSubscriber, MutationRecord, MutationSubscriber, Subscription,
};
pub use watch::{WatchHandle, WatchOptions};

use crate::config::StoreConfig;
use crate::module::{ModuleDefinition, ModuleTree};
use crate::reactive::LocalReactivity;
use getters::GetterCache;
use parking_lot::{Mutex, RwLock};
use registry::{LocalScope, Registry};
use serde_json::{Map, Value};
use statetree_core::{
    get_nested, DiagnosticLog, ErrorHook, ModulePath, Namespace, Reactivity, StateChange,
    WatchId,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use subscription::SubscriberList;
use tracing::info;

/// Plugin invoked once with the finished store
pub type Plugin = Box<dyn FnOnce(&Store) + Send>;

// =============================================================================
// Options
// =============================================================================

/// Options for [`Store::commit_with`] and [`LocalContext::commit_with`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// From a local context: commit the type as given, without the namespace
    pub root: bool,
    /// Removed; accepted and reported
    pub silent: bool,
}

/// Options for [`LocalContext::dispatch_with`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Dispatch the type as given, without the namespace
    pub root: bool,
}

/// Options for [`Store::register_module`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterOptions {
    /// Keep the state already present at the module's path instead of
    /// attaching the module's initial state
    pub preserve_state: bool,
}

// =============================================================================
// Store internals
// =============================================================================

pub(crate) struct StoreInner {
    pub(crate) config: StoreConfig,
    pub(crate) modules: RwLock<ModuleTree>,
    registry: RwLock<Arc<Registry>>,
    pub(crate) state: RwLock<Value>,
    pub(crate) committing: AtomicBool,
    pub(crate) subscribers: Mutex<SubscriberList<dyn Fn(&MutationRecord, &Value) + Send + Sync>>,
    pub(crate) action_subscribers: Mutex<SubscriberList<ActionSubscriber>>,
    pub(crate) getters: GetterCache,
    pub(crate) reactivity: Arc<dyn Reactivity>,
    pub(crate) diagnostics: Arc<DiagnosticLog>,
    pub(crate) error_hook: Option<Arc<dyn ErrorHook>>,
    strict_watch: Mutex<Option<WatchId>>,
}

impl StoreInner {
    /// Current registry snapshot
    pub(crate) fn registry(&self) -> Arc<Registry> {
        self.registry.read().clone()
    }

    pub(crate) fn replace_registry(&self, registry: Registry) {
        *self.registry.write() = Arc::new(registry);
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.state.read_recursive())
    }

    /// Run `f` with the committing flag set, restoring the previous value after
    pub(crate) fn with_commit<R>(&self, f: impl FnOnce() -> R) -> R {
        struct Restore<'a> {
            flag: &'a AtomicBool,
            previous: bool,
        }
        impl Drop for Restore<'_> {
            fn drop(&mut self) {
                self.flag.store(self.previous, Ordering::SeqCst);
            }
        }

        let _restore = Restore {
            flag: &self.committing,
            previous: self.committing.swap(true, Ordering::SeqCst),
        };
        f()
    }

    /// Deliver a change made under [`with_commit`](Self::with_commit)
    ///
    /// Called once the committing flag is restored, so observers run outside
    /// the guard and their own writes are checked like any other.
    pub(crate) fn notify_guarded(&self, change: StateChange) {
        self.reactivity.notify(&change.guarded());
    }

    fn scope(&self, path: &ModulePath) -> Option<LocalScope> {
        self.registry().scopes.get(path).cloned()
    }
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        if let Some(id) = self.strict_watch.get_mut().take() {
            self.reactivity.unwatch(id);
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Hierarchical, namespaced state container
///
/// # Example
///
/// ```ignore
/// let store = Store::new(
///     ModuleDefinition::new()
///         .state(json!({"count": 0}))
///         .mutation("increment", |state, by| {
///             state["count"] = json!(state["count"].as_i64().unwrap_or(0) + by.as_i64().unwrap_or(1));
///         }),
/// );
/// store.commit("increment", json!(2));
/// assert_eq!(store.state()["count"], 2);
/// ```
#[derive(Clone)]
pub struct Store {
    pub(crate) inner: Arc<StoreInner>,
}

impl Store {
    /// Build a store with the default configuration
    pub fn new(root: ModuleDefinition) -> Self {
        StoreBuilder::new(root).build()
    }

    /// Start configuring a store
    pub fn builder(root: ModuleDefinition) -> StoreBuilder {
        StoreBuilder::new(root)
    }

    /// Copy of the root state
    pub fn state(&self) -> Value {
        self.inner.with_state(Value::clone)
    }

    /// Read the root state without copying it
    ///
    /// `f` must not call back into the store's write paths.
    pub fn with_state<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        self.inner.with_state(f)
    }

    /// Copy of the state at a module path
    pub fn state_at(&self, path: impl Into<ModulePath>) -> Option<Value> {
        let path = path.into();
        self.inner
            .with_state(|root| get_nested(root, &path).cloned())
    }

    /// Root getter by qualified type
    pub fn getter(&self, kind: &str) -> Option<Value> {
        self.inner.with_getters(|evaluator| evaluator.resolve(kind))
    }

    /// All root getters in registration order
    pub fn getters(&self) -> Map<String, Value> {
        self.inner.with_getters(|evaluator| evaluator.all())
    }

    /// Root getter types in registration order
    pub fn getter_names(&self) -> Vec<String> {
        self.inner
            .registry()
            .getter_types()
            .map(str::to_string)
            .collect()
    }

    /// True if a module exists at `path`
    pub fn has_module(&self, path: impl Into<ModulePath>) -> bool {
        self.inner.modules.read().contains(&path.into())
    }

    /// Namespace of the module at `path`
    pub fn module_namespace(&self, path: impl Into<ModulePath>) -> Option<Namespace> {
        self.inner.modules.read().namespace(&path.into())
    }

    /// Path of the namespaced module that owns `namespace`
    pub fn module_by_namespace(&self, namespace: &Namespace) -> Option<ModulePath> {
        self.inner.registry().namespaces.get(namespace).cloned()
    }

    /// Local context of an installed module
    pub fn local_context(&self, path: impl Into<ModulePath>) -> Option<LocalContext> {
        let scope = self.inner.scope(&path.into())?;
        Some(LocalContext::new(self.clone(), scope))
    }

    /// True if strict mode is on
    pub fn is_strict(&self) -> bool {
        self.inner.config.strict
    }

    /// True while a guarded commit is running
    pub fn is_committing(&self) -> bool {
        self.inner.committing.load(Ordering::SeqCst)
    }

    /// Recorded diagnostics
    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.inner.diagnostics
    }

    /// Effective configuration
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// The reactivity engine driving this store
    pub fn reactivity(&self) -> &Arc<dyn Reactivity> {
        &self.inner.reactivity
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("strict", &self.inner.config.strict)
            .field("modules", &self.inner.modules.read().len())
            .field("state", &*self.inner.state.read_recursive())
            .finish()
    }
}

// =============================================================================
// StoreBuilder
// =============================================================================

/// Builder for [`Store`]
///
/// # Example
///
/// ```ignore
/// let store = Store::builder(root)
///     .strict(true)
///     .plugin(|store| { store.subscribe(|m, _| println!("{}", m.kind)); })
///     .build();
/// ```
///
/// # Settings
///
/// | Setting | Default | Effect |
/// |---------|---------|--------|
/// | `config` | `StoreConfig::default()` | base settings, e.g. from `statetree.toml` |
/// | `strict` | from config | report writes made outside mutation handlers |
/// | `plugin` | none | called in order with the finished store |
/// | `error_hook` | none | observes failing actions (if `devtools` is on) |
/// | `reactivity` | `LocalReactivity` | observation engine |
pub struct StoreBuilder {
    root: ModuleDefinition,
    config: StoreConfig,
    strict: Option<bool>,
    plugins: Vec<Plugin>,
    error_hook: Option<Arc<dyn ErrorHook>>,
    reactivity: Option<Arc<dyn Reactivity>>,
}

impl StoreBuilder {
    /// Builder for `root` with default settings
    pub fn new(root: ModuleDefinition) -> Self {
        Self {
            root,
            config: StoreConfig::default(),
            strict: None,
            plugins: Vec::new(),
            error_hook: None,
            reactivity: None,
        }
    }

    /// Base configuration
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable or disable strict mode, overriding the configuration
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    /// Add a plugin
    pub fn plugin<F>(mut self, plugin: F) -> Self
    where
        F: FnOnce(&Store) + Send + 'static,
    {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Observe failing action handlers
    pub fn error_hook(mut self, hook: Arc<dyn ErrorHook>) -> Self {
        self.error_hook = Some(hook);
        self
    }

    /// Use a specific reactivity engine
    ///
    /// An engine must not be shared between stores in strict mode: strict
    /// watchers see every change the engine is notified of.
    pub fn reactivity(mut self, reactivity: Arc<dyn Reactivity>) -> Self {
        self.reactivity = Some(reactivity);
        self
    }

    /// Install the module tree and run plugins
    pub fn build(self) -> Store {
        let mut config = self.config;
        if let Some(strict) = self.strict {
            config.strict = strict;
        }

        let diagnostics = Arc::new(
            DiagnosticLog::new(config.diagnostics, config.assertions)
                .with_capacity(config.diagnostics_capacity),
        );
        let tree = ModuleTree::new(&self.root, &*diagnostics);
        let state = tree.root().state().clone();
        let error_hook = if config.devtools { self.error_hook } else { None };
        let reactivity = self
            .reactivity
            .unwrap_or_else(|| Arc::new(LocalReactivity::new()));

        let inner = Arc::new(StoreInner {
            config,
            modules: RwLock::new(tree),
            registry: RwLock::new(Arc::new(Registry::default())),
            state: RwLock::new(state),
            committing: AtomicBool::new(false),
            subscribers: Mutex::new(SubscriberList::new()),
            action_subscribers: Mutex::new(SubscriberList::new()),
            getters: GetterCache::default(),
            reactivity,
            diagnostics,
            error_hook,
            strict_watch: Mutex::new(None),
        });

        if inner.config.strict {
            *inner.strict_watch.lock() = Some(strict::enable_strict_mode(&inner));
        }
        {
            let tree = inner.modules.read();
            inner.attach_states(&ModulePath::root(), tree.root());
        }
        inner.replace_registry(inner.install_all());

        let store = Store { inner };
        info!(
            target: "statetree::store",
            strict = store.inner.config.strict,
            modules = store.inner.modules.read().len(),
            plugins = self.plugins.len(),
            "Store installed"
        );

        for plugin in self.plugins {
            plugin(&store);
        }
        store
    }
}

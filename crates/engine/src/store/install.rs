//! Installing modules and rebuilding registries
//!
//! Installing walks the module tree top-down and binds every handler to its
//! module scope in a fresh [`Registry`]. Attaching state is a separate step,
//! performed when modules are created (construction and `register_module`),
//! never during a reinstall.
//!
//! A reset rebuilds the registry from the root, swaps it in, discards the
//! getter generation, and (for hot updates) emits a guarded change so that
//! watchers re-evaluate against the new getters.

use super::registry::{BoundAction, BoundGetter, BoundMutation, LocalScope, Registry};
use super::{RegisterOptions, Store, StoreInner};
use crate::module::{Module, ModuleDefinition, ModuleTree, Unregistered};
use statetree_core::{
    attach_child, detach_child, Attach, ChangeKind, Diagnostic, DiagnosticSink, ModulePath,
    Result, StateChange, StoreError,
};
use tracing::debug;

impl StoreInner {
    /// Attach the states of `module`'s descendants (and of `module` itself
    /// unless it is the root) under their parents
    pub(crate) fn attach_states(&self, path: &ModulePath, module: &Module) {
        if let (Some(parent), Some(name)) = (path.parent(), path.last()) {
            let outcome = self.with_commit(|| {
                attach_child(&mut self.state.write(), &parent, name, module.state().clone())
            });
            self.notify_guarded(StateChange::at(ChangeKind::ModuleAttached, path.clone()));
            match outcome {
                Attach::Inserted => {}
                Attach::Overridden => self.diagnostics.report(Diagnostic::StateFieldOverridden {
                    field: name.to_string(),
                    path: path.clone(),
                }),
                Attach::ParentUnreachable => {
                    self.diagnostics.report(Diagnostic::ModuleStateUnreachable {
                        path: path.clone(),
                        reason: format!("parent state at {} is not an object", parent),
                    })
                }
            }
        }
        for (name, child) in module.children() {
            self.attach_states(&path.child(name), child);
        }
    }

    /// Build a registry from the whole tree
    pub(crate) fn install_all(&self) -> Registry {
        let tree = self.modules.read();
        let mut registry = Registry::default();
        self.install(&mut registry, &tree, &ModulePath::root(), tree.root());
        debug!(
            target: "statetree::modules",
            mutations = registry.mutations.len(),
            actions = registry.actions.len(),
            namespaces = registry.namespaces.len(),
            "Modules installed"
        );
        registry
    }

    fn install(&self, registry: &mut Registry, tree: &ModuleTree, path: &ModulePath, module: &Module) {
        let namespace = tree.namespace(path).unwrap_or_default();

        if module.is_namespaced() {
            if self.diagnostics.enabled() && registry.namespaces.contains_key(&namespace) {
                self.diagnostics.report(Diagnostic::DuplicateNamespace {
                    namespace: namespace.clone(),
                    path: path.clone(),
                });
            }
            registry.namespaces.insert(namespace.clone(), path.clone());
        }

        let scope = LocalScope {
            namespace: namespace.clone(),
            path: path.clone(),
        };
        registry.scopes.insert(path.clone(), scope.clone());

        for (key, handler) in module.mutations() {
            registry.add_mutation(
                namespace.qualify(key),
                BoundMutation {
                    path: path.clone(),
                    handler: handler.clone(),
                },
            );
        }

        for (key, action) in module.actions() {
            // shape problems were reported at registration
            let Some(handler) = action.handler_fn() else {
                continue;
            };
            let kind = if action.is_root() {
                key.to_string()
            } else {
                namespace.qualify(key)
            };
            registry.add_action(BoundAction {
                kind,
                scope: scope.clone(),
                handler: handler.clone(),
            });
        }

        for (key, handler) in module.getters() {
            let kind = namespace.qualify(key);
            let getter = BoundGetter {
                scope: scope.clone(),
                handler: handler.clone(),
            };
            if !registry.add_getter(kind.clone(), getter) {
                self.diagnostics.report(Diagnostic::DuplicateGetter { kind });
            }
        }

        for (name, child) in module.children() {
            self.install(registry, tree, &path.child(name), child);
        }
    }

    /// Rebuild registries and drop memoized getters
    pub(crate) fn reset(&self, hot: bool) {
        self.replace_registry(self.install_all());
        let superseded = self.getters.renew();
        if hot {
            self.notify_guarded(StateChange::whole(ChangeKind::HotReload));
        }
        self.reactivity.next_tick(Box::new(move || drop(superseded)));
        self.reactivity.flush();
        debug!(target: "statetree::store", hot, "Store reset");
    }
}

impl Store {
    /// Register a module after construction
    ///
    /// The module (and its nested modules) are runtime modules and can be
    /// removed with [`unregister_module`](Self::unregister_module).
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidPath` for the root path
    /// - `StoreError::ModuleNotFound` if the parent module does not exist
    pub fn register_module(
        &self,
        path: impl Into<ModulePath>,
        definition: ModuleDefinition,
        options: RegisterOptions,
    ) -> Result<()> {
        let path = path.into();
        if path.is_root() {
            return Err(StoreError::InvalidPath(
                "cannot register the root module by using register_module".to_string(),
            ));
        }

        self.inner
            .modules
            .write()
            .register(&path, &definition, true, &*self.inner.diagnostics)?;

        if !options.preserve_state {
            let tree = self.inner.modules.read();
            if let Some(module) = tree.get(&path) {
                self.inner.attach_states(&path, module);
            }
        }
        self.inner.reset(false);
        debug!(target: "statetree::modules", path = %path, preserve_state = options.preserve_state, "Module registered");
        Ok(())
    }

    /// Remove a runtime module and its state
    ///
    /// Returns `Ok(false)` without changes if the module does not exist or was
    /// declared at construction.
    ///
    /// # Errors
    ///
    /// `StoreError::InvalidPath` for the root path.
    pub fn unregister_module(&self, path: impl Into<ModulePath>) -> Result<bool> {
        let path = path.into();
        let (Some(parent), Some(name)) = (path.parent(), path.last()) else {
            return Err(StoreError::InvalidPath(
                "cannot unregister the root module".to_string(),
            ));
        };

        let outcome = self.inner.modules.write().unregister(&path);
        if outcome != Unregistered::Removed {
            debug!(target: "statetree::modules", path = %path, ?outcome, "Unregister ignored");
            return Ok(false);
        }

        self.inner
            .with_commit(|| detach_child(&mut self.inner.state.write(), &parent, name));
        self.inner
            .notify_guarded(StateChange::at(ChangeKind::ModuleDetached, path.clone()));
        self.inner.reset(false);
        debug!(target: "statetree::modules", path = %path, "Module unregistered");
        Ok(true)
    }

    /// Swap handlers from a new root definition, keeping all state
    ///
    /// Modules absent from `definition` keep their handlers; nested
    /// definitions without a live module are reported and skipped.
    pub fn hot_update(&self, definition: ModuleDefinition) {
        self.inner
            .modules
            .write()
            .update(&definition, &*self.inner.diagnostics);
        self.inner.reset(true);
        debug!(target: "statetree::modules", "Hot update applied");
    }
}

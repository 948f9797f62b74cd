//! Module tree
//!
//! The tree is rooted at the module built from the store's root definition.
//! Paths address modules by child names; the namespace of a path is the
//! concatenation of `name/` for every namespaced module along it.
//!
//! ## Runtime flag
//!
//! Modules created while constructing the store are static. Modules created
//! through `register` after construction are runtime modules, and only those
//! can be removed again.

use super::definition::ModuleDefinition;
use super::node::Module;
use super::validate::assert_raw_module;
use statetree_core::{Diagnostic, DiagnosticSink, ModulePath, Namespace, Result, StoreError};
use tracing::debug;

/// Outcome of [`ModuleTree::unregister`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unregistered {
    /// The module and its subtree were removed
    Removed,
    /// The module exists but was declared at construction time
    Static,
    /// No module at the path
    Missing,
}

/// The module hierarchy
#[derive(Debug)]
pub struct ModuleTree {
    root: Module,
}

impl ModuleTree {
    /// Build the static tree for `root`
    pub fn new(root: &ModuleDefinition, sink: &dyn DiagnosticSink) -> Self {
        let path = ModulePath::root();
        assert_raw_module(&path, root, sink);
        let mut tree = Self {
            root: Module::new(root, false),
        };
        tree.register_children(&path, root, false, sink);
        tree
    }

    /// The root module
    pub fn root(&self) -> &Module {
        &self.root
    }

    /// Module at `path`
    pub fn get(&self, path: &ModulePath) -> Option<&Module> {
        path.segments()
            .iter()
            .try_fold(&self.root, |module, name| module.child(name))
    }

    /// Module at `path`, mutably
    pub fn get_mut(&mut self, path: &ModulePath) -> Option<&mut Module> {
        let mut module = &mut self.root;
        for name in path.segments() {
            module = module.child_mut(name)?;
        }
        Some(module)
    }

    /// True if a module exists at `path`
    pub fn contains(&self, path: &ModulePath) -> bool {
        self.get(path).is_some()
    }

    /// Namespace of `path`, or `None` if a segment does not resolve
    pub fn namespace(&self, path: &ModulePath) -> Option<Namespace> {
        let mut namespace = Namespace::root();
        let mut module = &self.root;
        for name in path.segments() {
            module = module.child(name)?;
            if module.is_namespaced() {
                namespace.push(name);
            }
        }
        Some(namespace)
    }

    /// Number of modules in the tree
    pub fn len(&self) -> usize {
        self.root.subtree_len()
    }

    /// Always false: the root module exists
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Build `definition` (and its nested definitions) at `path`
    ///
    /// An existing module at `path` is replaced. Registering the root path
    /// replaces the root module.
    ///
    /// # Errors
    /// `StoreError::ModuleNotFound` if the parent of `path` does not exist.
    pub fn register(
        &mut self,
        path: &ModulePath,
        definition: &ModuleDefinition,
        runtime: bool,
        sink: &dyn DiagnosticSink,
    ) -> Result<()> {
        assert_raw_module(path, definition, sink);
        let module = Module::new(definition, runtime);

        match (path.parent(), path.last()) {
            (Some(parent_path), Some(name)) => {
                let parent = self
                    .get_mut(&parent_path)
                    .ok_or(StoreError::ModuleNotFound(parent_path))?;
                parent.add_child(name, module);
            }
            _ => self.root = module,
        }

        self.register_children(path, definition, runtime, sink);
        Ok(())
    }

    fn register_children(
        &mut self,
        path: &ModulePath,
        definition: &ModuleDefinition,
        runtime: bool,
        sink: &dyn DiagnosticSink,
    ) {
        let Some(children) = definition.modules() else {
            return;
        };
        for (name, child) in children.iter() {
            // parent was just inserted, so this cannot fail
            if let Err(e) = self.register(&path.child(name), child, runtime, sink) {
                debug!(target: "statetree::modules", path = %path, error = %e, "Nested registration skipped");
            }
        }
    }

    /// Remove the runtime module at `path` together with its subtree
    ///
    /// Static and missing modules are left in place.
    pub fn unregister(&mut self, path: &ModulePath) -> Unregistered {
        let (Some(parent_path), Some(name)) = (path.parent(), path.last()) else {
            return Unregistered::Static;
        };
        let Some(parent) = self.get_mut(&parent_path) else {
            return Unregistered::Missing;
        };
        match parent.child(name) {
            None => Unregistered::Missing,
            Some(child) if !child.is_runtime() => Unregistered::Static,
            Some(_) => {
                parent.remove_child(name);
                Unregistered::Removed
            }
        }
    }

    /// Hot-update handlers from a new root definition
    ///
    /// Walks `definition` alongside the live tree. Each existing module gets a
    /// partial update; a nested definition with no live counterpart is reported
    /// and its subtree skipped, while its siblings are still updated.
    pub fn update(&mut self, definition: &ModuleDefinition, sink: &dyn DiagnosticSink) {
        update_module(&ModulePath::root(), &mut self.root, definition, sink);
    }
}

fn update_module(
    path: &ModulePath,
    target: &mut Module,
    definition: &ModuleDefinition,
    sink: &dyn DiagnosticSink,
) {
    assert_raw_module(path, definition, sink);
    target.update(definition);

    let Some(children) = definition.modules() else {
        return;
    };
    for (key, child_definition) in children.iter() {
        match target.child_mut(key) {
            Some(child) => update_module(&path.child(key), child, child_definition, sink),
            None => sink.report(Diagnostic::NewModuleOnHotUpdate {
                path: path.clone(),
                key: key.to_string(),
            }),
        }
    }
}

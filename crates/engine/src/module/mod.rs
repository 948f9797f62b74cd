//! Module definitions and the runtime module tree
//!
//! - `definition`: raw, caller-supplied module definitions and handler types
//! - `node`: runtime module nodes
//! - `tree`: the hierarchy, path lookup, namespace derivation, hot update
//! - `validate`: shape checks run when a definition is registered

mod definition;
mod node;
mod tree;
mod validate;

pub use definition::{
    ActionDef, ActionFn, ActionFuture, GetterFn, ModuleDefinition, MutationFn, NamedMap,
    StateFn, StateInit,
};
pub use node::Module;
pub use tree::{ModuleTree, Unregistered};
pub use validate::assert_raw_module;

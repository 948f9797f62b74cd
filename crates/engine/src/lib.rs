//! Store engine for statetree
//!
//! This crate builds on the core types:
//! - Module: raw definitions, the runtime module tree, hot update
//! - Store: installation into flattened registries, commit/dispatch pipelines,
//!   local contexts, memoized getters, subscriptions, strict mode, watch
//! - Reactivity: the default in-process observation engine
//! - Config: `statetree.toml` settings
//!
//! The engine is the only component that knows about:
//! - How module paths map to namespaces and state locations
//! - When registries are rebuilt and getter caches dropped
//! - Which writes are guarded commits

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod module;
pub mod reactive;
pub mod store;

pub use config::{StoreConfig, CONFIG_FILE_NAME};
pub use module::{ActionDef, ActionFn, ActionFuture, GetterFn, ModuleDefinition, MutationFn};
pub use reactive::LocalReactivity;
pub use store::{
    ActionContext, ActionHook, ActionRecord, ActionSubscriber, CommitOptions, Dispatch,
    DispatchOptions, GetterScope, LocalContext, MutationRecord, MutationSubscriber, Plugin,
    RegisterOptions, Store, StoreBuilder, Subscription, WatchHandle, WatchOptions,
};

//! statetree - hierarchical, namespaced state container
//!
//! A single state tree is split into modules. Each module contributes a slice
//! of state and three kinds of handlers: mutations (synchronous, the only
//! sanctioned way to change state), actions (possibly asynchronous, may commit
//! and dispatch) and getters (memoized derived values).
//!
//! # Quick Start
//!
//! ```ignore
//! use statetree::{json, ModuleDefinition, Store};
//!
//! let cart = ModuleDefinition::new()
//!     .namespaced()
//!     .state(json!({"items": []}))
//!     .mutation("addItem", |state, item| {
//!         if let Some(items) = state["items"].as_array_mut() {
//!             items.push(item.clone());
//!         }
//!     })
//!     .getter("count", |scope| json!(scope.state()["items"].as_array().map_or(0, Vec::len)));
//!
//! let store = Store::new(ModuleDefinition::new().module("cart", cart));
//! store.commit("cart/addItem", json!({"price": 3}));
//! assert_eq!(store.getter("cart/count"), Some(json!(1)));
//! ```
//!
//! # Architecture
//!
//! - `statetree-core`: paths, namespaces, calls, errors, diagnostics and the
//!   collaborator traits (`Reactivity`, `DiagnosticSink`, `ErrorHook`)
//! - `statetree-engine`: module tree, store, default reactivity, configuration

pub use serde_json::{json, Value};
pub use statetree_core::*;
pub use statetree_engine::*;

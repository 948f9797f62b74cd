//! Reactive watch
//!
//! `watch` evaluates an expression in the root getter scope and re-evaluates
//! it on every change the reactivity engine reports. The callback runs only
//! when the value differs from the last one seen.

use super::getters::GetterScope;
use super::Store;
use parking_lot::Mutex;
use serde_json::Value;
use statetree_core::{Reactivity, StateChange, WatchId};
use std::sync::Arc;

/// Options for [`Store::watch`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchOptions {
    /// Call the callback once right away, with `null` as the previous value
    pub immediate: bool,
}

/// Handle returned by [`Store::watch`]
pub struct WatchHandle {
    reactivity: Arc<dyn Reactivity>,
    id: WatchId,
}

impl WatchHandle {
    /// Stop watching; calling it again has no effect
    pub fn unwatch(&self) {
        self.reactivity.unwatch(self.id);
    }

    /// Underlying watch id
    pub fn id(&self) -> WatchId {
        self.id
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("WatchHandle").field(&self.id).finish()
    }
}

impl Store {
    /// Watch a value derived from the root state and root getters
    ///
    /// `callback` receives `(new, old)`.
    ///
    /// ```ignore
    /// let handle = store.watch(
    ///     |scope| scope.root_getter("cart/total").unwrap_or_default(),
    ///     |total, _| println!("total is now {}", total),
    ///     WatchOptions::default(),
    /// );
    /// ```
    pub fn watch<G, C>(&self, getter: G, callback: C, options: WatchOptions) -> WatchHandle
    where
        G: Fn(&GetterScope<'_>) -> Value + Send + Sync + 'static,
        C: Fn(&Value, &Value) + Send + Sync + 'static,
    {
        let initial = self.inner.evaluate_root(&getter);
        if options.immediate {
            callback(&initial, &Value::Null);
        }

        let store = Arc::downgrade(&self.inner);
        let last = Mutex::new(initial);
        let id = self
            .inner
            .reactivity
            .watch(Arc::new(move |_: &StateChange| {
                let Some(inner) = store.upgrade() else {
                    return;
                };
                let next = inner.evaluate_root(&getter);
                let previous = {
                    let mut last = last.lock();
                    if *last == next {
                        return;
                    }
                    std::mem::replace(&mut *last, next.clone())
                };
                callback(&next, &previous);
            }));

        WatchHandle {
            reactivity: self.inner.reactivity.clone(),
            id,
        }
    }
}

//! Strict mode
//!
//! A deep watcher on the whole state asserts that every change it is told
//! about was made inside a guarded commit. Changes are delivered after the
//! guard is released, so a write made by another observer in response is
//! judged on its own. The watcher holds the store weakly and is removed when
//! the store is dropped.

use super::StoreInner;
use statetree_core::{Diagnostic, DiagnosticSink, StateChange, WatchId};
use std::sync::Arc;
use tracing::debug;

pub(crate) fn enable_strict_mode(inner: &Arc<StoreInner>) -> WatchId {
    let store = Arc::downgrade(inner);
    let id = inner.reactivity.watch(Arc::new(move |change: &StateChange| {
        let Some(inner) = store.upgrade() else {
            return;
        };
        if !change.guarded {
            inner.diagnostics.report(Diagnostic::StrictModeViolation {
                change: change.to_string(),
            });
        }
    }));
    debug!(target: "statetree::store", watch = id.0, "Strict mode enabled");
    id
}

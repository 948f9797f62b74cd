//! Default in-process reactivity engine
//!
//! [`LocalReactivity`] implements the observation contract with an epoch
//! counter, a list of deep watchers and a deferred task queue.
//!
//! ## Design
//!
//! - `notify` advances the epoch first, then calls every watcher synchronously
//!   on the caller's thread. Watchers are snapshotted before delivery so a
//!   watcher may register or remove watchers without deadlocking.
//! - `next_tick` queues; `flush` drains the queue in FIFO order. The store
//!   flushes after each reset, which ends its observation cycle.

use parking_lot::{Mutex, RwLock};
use statetree_core::{Reactivity, StateChange, Task, WatchFn, WatchId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-process [`Reactivity`] implementation
pub struct LocalReactivity {
    epoch: AtomicU64,
    next_id: AtomicU64,
    watchers: RwLock<Vec<(WatchId, WatchFn)>>,
    pending: Mutex<Vec<Task>>,
}

impl LocalReactivity {
    /// New engine at epoch 0 with no watchers
    pub fn new() -> Self {
        Self {
            epoch: AtomicU64::new(0),
            next_id: AtomicU64::new(1),
            watchers: RwLock::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Number of registered watchers
    pub fn watcher_count(&self) -> usize {
        self.watchers.read().len()
    }

    /// Number of tasks waiting for the next flush
    pub fn pending_tasks(&self) -> usize {
        self.pending.lock().len()
    }
}

impl Default for LocalReactivity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LocalReactivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalReactivity")
            .field("epoch", &self.epoch())
            .field("watchers", &self.watcher_count())
            .field("pending", &self.pending_tasks())
            .finish()
    }
}

impl Reactivity for LocalReactivity {
    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    fn notify(&self, change: &StateChange) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        let watchers: Vec<WatchFn> = self
            .watchers
            .read()
            .iter()
            .map(|(_, watcher)| watcher.clone())
            .collect();
        for watcher in watchers {
            watcher(change);
        }
    }

    fn watch(&self, callback: WatchFn) -> WatchId {
        let id = WatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.watchers.write().push((id, callback));
        id
    }

    fn unwatch(&self, id: WatchId) {
        self.watchers.write().retain(|(existing, _)| *existing != id);
    }

    fn next_tick(&self, task: Task) {
        self.pending.lock().push(task);
    }

    fn flush(&self) {
        let tasks = std::mem::take(&mut *self.pending.lock());
        for task in tasks {
            task();
        }
    }
}

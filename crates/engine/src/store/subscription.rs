//! Mutation and action subscribers
//!
//! Subscribers are kept in registration order. Adding the same shared
//! subscriber twice keeps a single entry; every registration returns a
//! [`Subscription`] handle whose `unsubscribe` is idempotent.
//!
//! Notification iterates over a snapshot, so a subscriber that unsubscribes
//! (itself or another) during delivery does not disturb the current round.

use super::StoreInner;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Weak};

/// Mutation subscriber: `(mutation, state after the commit)`
pub type MutationSubscriber = Arc<dyn Fn(&MutationRecord, &Value) + Send + Sync>;

/// Action subscriber hook: `(action, current state)`
///
/// A returned error is reported as a diagnostic and does not affect the dispatch.
pub type ActionHook = Arc<dyn Fn(&ActionRecord, &Value) -> anyhow::Result<()> + Send + Sync>;

/// A committed mutation as seen by subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationRecord {
    /// Qualified mutation type
    #[serde(rename = "type")]
    pub kind: String,
    /// Payload handed to the handlers
    pub payload: Value,
}

/// A dispatched action as seen by subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    /// Qualified action type
    #[serde(rename = "type")]
    pub kind: String,
    /// Payload handed to the handlers
    pub payload: Value,
}

/// Before/after hooks for dispatched actions
#[derive(Clone, Default)]
pub struct ActionSubscriber {
    /// Runs before any handler starts
    pub before: Option<ActionHook>,
    /// Runs after all handlers settle successfully
    pub after: Option<ActionHook>,
}

impl ActionSubscriber {
    /// Subscriber with only a `before` hook
    pub fn before<F>(hook: F) -> Self
    where
        F: Fn(&ActionRecord, &Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            before: Some(Arc::new(hook)),
            after: None,
        }
    }

    /// Subscriber with only an `after` hook
    pub fn after<F>(hook: F) -> Self
    where
        F: Fn(&ActionRecord, &Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            before: None,
            after: Some(Arc::new(hook)),
        }
    }

    /// Add or replace the `after` hook
    pub fn and_after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ActionRecord, &Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for ActionSubscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSubscriber")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

// =============================================================================
// SubscriberList
// =============================================================================

/// Ordered, deduplicating subscriber list
pub(crate) struct SubscriberList<T: ?Sized> {
    entries: Vec<(u64, Arc<T>)>,
    next_id: u64,
}

impl<T: ?Sized> SubscriberList<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Add `subscriber` unless the same allocation is already present
    pub fn add(&mut self, subscriber: Arc<T>) -> u64 {
        let target = Arc::as_ptr(&subscriber) as *const ();
        if let Some((id, _)) = self
            .entries
            .iter()
            .find(|(_, existing)| Arc::as_ptr(existing) as *const () == target)
        {
            return *id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, subscriber));
        id
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.len() != before
    }

    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries.iter().map(|(_, s)| s.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// =============================================================================
// Subscription handle
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Channel {
    Mutations,
    Actions,
}

/// Handle returned by `subscribe` and `subscribe_action`
///
/// Holds the store weakly: dropping the handle does not unsubscribe, and the
/// handle does not keep the store alive.
#[derive(Debug, Clone)]
pub struct Subscription {
    store: Weak<StoreInner>,
    channel: Channel,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(store: Weak<StoreInner>, channel: Channel, id: u64) -> Self {
        Self { store, channel, id }
    }

    /// Remove the subscriber; calling it again has no effect
    pub fn unsubscribe(&self) {
        let Some(store) = self.store.upgrade() else {
            return;
        };
        match self.channel {
            Channel::Mutations => store.subscribers.lock().remove(self.id),
            Channel::Actions => store.action_subscribers.lock().remove(self.id),
        };
    }
}

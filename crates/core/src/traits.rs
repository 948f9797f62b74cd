//! Collaborator traits
//!
//! The store never reaches for a global framework instance. Everything it
//! delegates is passed in explicitly as one of these capabilities:
//! - Reactivity: change observation, derived-value invalidation, deferral
//! - DiagnosticSink: the non-fatal reporting channel
//! - ErrorHook: external observer of action failures

use crate::diagnostic::Diagnostic;
use crate::types::StateChange;
use std::sync::Arc;

/// Callback invoked for every observed change
pub type WatchFn = Arc<dyn Fn(&StateChange) + Send + Sync>;

/// Deferred task queued with [`Reactivity::next_tick`]
pub type Task = Box<dyn FnOnce() + Send>;

/// Handle for a deep-watch registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Observation engine contract
///
/// The store makes every write to the root state known through [`notify`](Self::notify)
/// and relies on the engine for:
///
/// 1. **Deep watch**: every change is delivered to every watcher synchronously,
///    before `notify` returns.
/// 2. **Derived values**: [`epoch`](Self::epoch) advances on every change; a value
///    derived from the state at epoch `e` is current exactly while `epoch() == e`.
/// 3. **Deferral**: [`next_tick`](Self::next_tick) runs a task after the current
///    observation cycle, used to release a superseded getter generation after a reset.
///
/// Adding a property to the state at runtime is an ordinary write followed by
/// `notify`, so no separate primitive is required.
///
/// Thread safety: implementations must be callable from any thread.
pub trait Reactivity: Send + Sync {
    /// Current observation epoch
    fn epoch(&self) -> u64;

    /// Record a change: advance the epoch, then deliver it to every watcher
    fn notify(&self, change: &StateChange);

    /// Register a deep watcher
    fn watch(&self, callback: WatchFn) -> WatchId;

    /// Remove a deep watcher; unknown ids are ignored
    fn unwatch(&self, id: WatchId);

    /// Defer `task` until the current observation cycle completes
    fn next_tick(&self, task: Task);

    /// Run deferred tasks now
    ///
    /// Engines driven by an external scheduler may leave this a no-op.
    fn flush(&self) {}
}

/// Non-fatal reporting channel
pub trait DiagnosticSink: Send + Sync {
    /// Whether checks should run at all
    ///
    /// Callers skip building diagnostics (and the checks that produce them)
    /// when this is false.
    fn enabled(&self) -> bool {
        true
    }

    /// Report a diagnostic
    fn report(&self, diagnostic: Diagnostic);
}

/// External observer of action failures
///
/// When attached, every failing action handler is reported here before the
/// failure is re-raised to the dispatcher.
pub trait ErrorHook: Send + Sync {
    /// Called once per failing handler
    fn action_error(&self, action: &str, error: &anyhow::Error);
}

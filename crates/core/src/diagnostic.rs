//! Diagnostics: the non-fatal reporting channel
//!
//! The store degrades around most misuse instead of failing: an unknown mutation
//! type is a no-op, a duplicate getter is dropped, a colliding state field is
//! overwritten. Each of these produces a [`Diagnostic`] that is emitted through
//! `tracing` and recorded in a [`DiagnosticLog`].
//!
//! ## Severities
//!
//! | Severity | Meaning | Effect |
//! |----------|---------|--------|
//! | Warning | suspicious but well-defined | logged |
//! | Error | the triggering call was dropped or degraded | logged |
//! | Violation | consistency contract broken | logged, panics under `AssertionMode::Panic` |
//!
//! A disabled log (production builds) skips every check, including violations.

use crate::traits::DiagnosticSink;
use crate::types::{ModulePath, Namespace};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Suspicious but well-defined behavior
    Warning,
    /// The triggering call was dropped or degraded
    Error,
    /// Hard consistency contract violation
    Violation,
}

/// Which handler table a shape problem was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// `mutations`
    Mutation,
    /// `actions`
    Action,
    /// `getters`
    Getter,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKind::Mutation => write!(f, "mutations"),
            HandlerKind::Action => write!(f, "actions"),
            HandlerKind::Getter => write!(f, "getters"),
        }
    }
}

/// Which subscriber hook failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberPhase {
    /// Action subscriber run before handlers start
    BeforeAction,
    /// Action subscriber run after handlers settle
    AfterAction,
}

impl fmt::Display for SubscriberPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriberPhase::BeforeAction => write!(f, "before"),
            SubscriberPhase::AfterAction => write!(f, "after"),
        }
    }
}

/// A reported, non-fatal problem
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    /// A handler entry does not have the required shape
    #[error("{kind} should be {expected} but \"{kind}.{key}\"{} is {found}", in_module(.path))]
    InvalidHandlerShape {
        /// Module the definition belongs to
        path: ModulePath,
        /// Handler table
        kind: HandlerKind,
        /// Handler name
        key: String,
        /// Expected shape
        expected: &'static str,
        /// What was found instead
        found: String,
    },

    /// Two namespaced modules derived the same namespace
    #[error("duplicate namespace {namespace} for the namespaced module {path}")]
    DuplicateNamespace {
        /// Colliding namespace
        namespace: Namespace,
        /// Module that registered second
        path: ModulePath,
    },

    /// A getter type was registered twice; the first registration wins
    #[error("duplicate getter key: {kind}")]
    DuplicateGetter {
        /// Qualified getter type
        kind: String,
    },

    /// `commit` named a type with no registered handler
    #[error("unknown mutation type: {kind}")]
    UnknownMutation {
        /// Requested type
        kind: String,
    },

    /// `dispatch` named a type with no registered handler
    #[error("unknown action type: {kind}")]
    UnknownAction {
        /// Requested type
        kind: String,
    },

    /// A namespaced local commit resolved to an unregistered type
    #[error("unknown local mutation type: {local}, global type: {global}")]
    UnknownLocalMutation {
        /// Type as written by the handler
        local: String,
        /// Namespace-qualified type
        global: String,
    },

    /// A namespaced local dispatch resolved to an unregistered type
    #[error("unknown local action type: {local}, global type: {global}")]
    UnknownLocalAction {
        /// Type as written by the handler
        local: String,
        /// Namespace-qualified type
        global: String,
    },

    /// A module's state replaced an existing field of its parent's state
    #[error("state field \"{field}\" was overridden by a module with the same name at \"{path}\"")]
    StateFieldOverridden {
        /// Overridden field
        field: String,
        /// Module path
        path: ModulePath,
    },

    /// A module's state could not be attached or resolved
    #[error("state of module {path} is unreachable: {reason}")]
    ModuleStateUnreachable {
        /// Module path
        path: ModulePath,
        /// Why the state could not be reached
        reason: String,
    },

    /// Hot update named a module that does not exist in the live tree
    #[error("trying to add a new module '{key}' under {path} on hot reloading, manual reload is needed")]
    NewModuleOnHotUpdate {
        /// Parent module path
        path: ModulePath,
        /// New child name
        key: String,
    },

    /// An action subscriber returned an error; it was swallowed
    #[error("error in {phase} action subscriber for {kind}: {message}")]
    SubscriberFailed {
        /// Hook that failed
        phase: SubscriberPhase,
        /// Action type being dispatched
        kind: String,
        /// Rendered subscriber error
        message: String,
    },

    /// The removed `silent` commit option was used
    #[error("mutation type: {kind}. Silent option has been removed")]
    SilentOptionRemoved {
        /// Committed type
        kind: String,
    },

    /// State changed outside a guarded commit while strict mode is on
    #[error("do not mutate store state outside mutation handlers ({change})")]
    StrictModeViolation {
        /// Description of the offending change
        change: String,
    },
}

fn in_module(path: &ModulePath) -> String {
    if path.is_root() {
        String::new()
    } else {
        format!(" in module \"{}\"", path)
    }
}

impl Diagnostic {
    /// Severity of this diagnostic
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::StateFieldOverridden { .. }
            | Diagnostic::NewModuleOnHotUpdate { .. }
            | Diagnostic::SubscriberFailed { .. }
            | Diagnostic::SilentOptionRemoved { .. } => Severity::Warning,
            Diagnostic::StrictModeViolation { .. } => Severity::Violation,
            _ => Severity::Error,
        }
    }
}

/// What to do when a consistency violation is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionMode {
    /// Halt: panic with the diagnostic message
    Panic,
    /// Record and log only
    Report,
}

impl Default for AssertionMode {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            AssertionMode::Panic
        } else {
            AssertionMode::Report
        }
    }
}

/// Default number of diagnostics a [`DiagnosticLog`] retains
pub const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 1024;

/// Recording diagnostic sink
///
/// Every reported diagnostic is emitted to `tracing` under the
/// `statetree::diagnostics` target. The most recent `capacity` diagnostics are
/// kept in memory until [`take`](Self::take); older ones are dropped.
#[derive(Debug)]
pub struct DiagnosticLog {
    enabled: bool,
    assertions: AssertionMode,
    capacity: usize,
    records: Mutex<VecDeque<Diagnostic>>,
}

impl DiagnosticLog {
    /// Create a log retaining [`DEFAULT_DIAGNOSTICS_CAPACITY`] entries
    pub fn new(enabled: bool, assertions: AssertionMode) -> Self {
        Self {
            enabled,
            assertions,
            capacity: DEFAULT_DIAGNOSTICS_CAPACITY,
            records: Mutex::new(VecDeque::new()),
        }
    }

    /// Retain at most `capacity` diagnostics (0 keeps none)
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Maximum number of retained diagnostics
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Enabled log that never panics (useful in tests)
    pub fn reporting() -> Self {
        Self::new(true, AssertionMode::Report)
    }

    /// Whether checks run at all
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Copy of all recorded diagnostics
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.records.lock().iter().cloned().collect()
    }

    /// Drain all recorded diagnostics
    pub fn take(&self) -> Vec<Diagnostic> {
        self.records.lock().drain(..).collect()
    }

    /// Number of recorded diagnostics
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// True if any recorded diagnostic satisfies `predicate`
    pub fn any(&self, predicate: impl Fn(&Diagnostic) -> bool) -> bool {
        self.records.lock().iter().any(predicate)
    }
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::new(cfg!(debug_assertions), AssertionMode::default())
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn report(&self, diagnostic: Diagnostic) {
        if !self.enabled {
            return;
        }
        let severity = diagnostic.severity();
        match severity {
            Severity::Warning => warn!(target: "statetree::diagnostics", "{}", diagnostic),
            Severity::Error | Severity::Violation => {
                error!(target: "statetree::diagnostics", "{}", diagnostic)
            }
        }
        let message = diagnostic.to_string();
        if self.capacity > 0 {
            let mut records = self.records.lock();
            if records.len() == self.capacity {
                records.pop_front();
            }
            records.push_back(diagnostic);
        }
        if severity == Severity::Violation && self.assertions == AssertionMode::Panic {
            panic!("[statetree] {}", message);
        }
    }
}

//! Core types and traits for statetree
//!
//! This crate defines the foundational types used throughout the system:
//! - ModulePath: Address of a module in the module tree
//! - Namespace: Path-derived prefix qualifying handler types
//! - Call: Normalized commit/dispatch request
//! - StateChange: Write notification delivered to observers
//! - StoreError: Error type for fallible store operations
//! - Diagnostic: Non-fatal reports (unknown types, duplicates, strict violations)
//! - Traits: Collaborator contracts (Reactivity, DiagnosticSink, ErrorHook)
//! - JSON helpers: nested state access along module paths

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diagnostic;
pub mod error;
pub mod json;
pub mod traits;
pub mod types;

pub use diagnostic::{
    AssertionMode, Diagnostic, DiagnosticLog, HandlerKind, Severity, SubscriberPhase,
    DEFAULT_DIAGNOSTICS_CAPACITY,
};
pub use error::{Result, StoreError};
pub use json::{attach_child, detach_child, empty_state, get_nested, get_nested_mut, Attach};
pub use traits::{DiagnosticSink, ErrorHook, Reactivity, Task, WatchFn, WatchId};
pub use types::{value_type_name, Call, ChangeKind, ModulePath, Namespace, StateChange};

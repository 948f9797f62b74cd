//! Error types for statetree
//!
//! Only operations that the caller must handle return errors. Everything the
//! store can degrade around (unknown types, duplicate getters, collisions) is a
//! [`Diagnostic`](crate::diagnostic::Diagnostic) instead.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::ModulePath;
use std::io;
use thiserror::Error;

/// Result type alias for statetree operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error types for the store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Path rejected for the requested operation (e.g. registering the root)
    #[error("Invalid module path: {0}")]
    InvalidPath(String),

    /// No module at the given path
    #[error("Module not found: {0}")]
    ModuleNotFound(ModulePath),

    /// Malformed commit or dispatch call
    #[error("Invalid call: {0}")]
    InvalidCall(String),

    /// An action handler failed; the error is re-raised to the dispatcher
    #[error("Action '{action}' failed: {source}")]
    ActionFailed {
        /// Action type that was dispatched
        action: String,
        /// Failure returned by the handler
        #[source]
        source: anyhow::Error,
    },

    /// Configuration could not be parsed or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error while loading configuration
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Wrap a handler failure for the given action type
    pub fn action_failed(action: impl Into<String>, source: anyhow::Error) -> Self {
        StoreError::ActionFailed {
            action: action.into(),
            source,
        }
    }
}

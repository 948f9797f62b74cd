//! Store configuration via `statetree.toml`
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Builder calls on [`StoreBuilder`](crate::StoreBuilder)
//! override what was loaded.

use serde::{Deserialize, Serialize};
use statetree_core::{AssertionMode, Result, StoreError, DEFAULT_DIAGNOSTICS_CAPACITY};
use std::path::Path;

/// Config file name looked up by applications that keep one next to their data.
pub const CONFIG_FILE_NAME: &str = "statetree.toml";

/// Store configuration loaded from `statetree.toml`.
///
/// # Example
///
/// ```toml
/// # Flag any state write made outside a mutation handler
/// strict = true
///
/// # "panic" halts on a strict-mode violation, "report" only records it
/// assertions = "report"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Enable strict mode.
    #[serde(default)]
    pub strict: bool,
    /// Attach the error hook passed to the builder.
    #[serde(default = "default_true")]
    pub devtools: bool,
    /// Run development checks and record diagnostics.
    #[serde(default = "default_diagnostics")]
    pub diagnostics: bool,
    /// What a consistency violation does.
    #[serde(default)]
    pub assertions: AssertionMode,
    /// How many recent diagnostics the store keeps in memory.
    #[serde(default = "default_diagnostics_capacity")]
    pub diagnostics_capacity: usize,
}

fn default_true() -> bool {
    true
}

fn default_diagnostics() -> bool {
    cfg!(debug_assertions)
}

fn default_diagnostics_capacity() -> usize {
    DEFAULT_DIAGNOSTICS_CAPACITY
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            strict: false,
            devtools: default_true(),
            diagnostics: default_diagnostics(),
            assertions: AssertionMode::default(),
            diagnostics_capacity: default_diagnostics_capacity(),
        }
    }
}

impl StoreConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# statetree store configuration
#
# Strict mode: flag any write to the state made outside a mutation handler
# (default: false). Expensive: every write is observed by a deep watcher.
strict = false

# Attach the error hook passed to the builder (default: true)
devtools = true

# Run development checks and record diagnostics
# (default: true in debug builds, false in release builds)
# diagnostics = true

# What a consistency violation does: "panic" or "report"
# (default: "panic" in debug builds, "report" in release builds)
# assertions = "panic"

# How many recent diagnostics are kept in memory; older ones are dropped
# (default: 1024)
diagnostics_capacity = 1024
"#
    }

    /// Parse a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` if the text is not valid TOML or names an
    /// unknown assertion mode.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be read and
    /// `StoreError::Config` if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            StoreError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Serialize this config to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| StoreError::Config(format!("Failed to serialize config: {}", e)))
    }
}

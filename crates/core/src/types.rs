//! Core types for statetree
//!
//! This module defines the addressing types shared by the module tree and the store:
//! - ModulePath: Ordered sequence of child names from the root module
//! - Namespace: Path-derived prefix qualifying a module's handler types
//! - Call: Normalized commit/dispatch request (type + payload)
//! - StateChange: Description of a write delivered to state observers

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;

/// Separator used both in namespaces and in `ModulePath::parse`.
pub const NAMESPACE_SEPARATOR: char = '/';

// =============================================================================
// ModulePath
// =============================================================================

/// Path of a module inside the module tree
///
/// A path is the ordered list of child names followed from the root module.
/// The empty path denotes the root module itself.
///
/// Most trees are shallow, so segments are stored inline up to four levels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModulePath(SmallVec<[String; 4]>);

impl ModulePath {
    /// The root path (no segments)
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    /// Build a path from its segments
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a slash separated path such as `"cart/items"`
    ///
    /// Empty segments are ignored, so `""` and `"/"` both parse to the root.
    pub fn parse(s: &str) -> Self {
        Self::from_segments(
            s.split(NAMESPACE_SEPARATOR)
                .filter(|segment| !segment.is_empty()),
        )
    }

    /// True for the root path
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the path has no segments
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path segments in order
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Last segment (the module's own name); `None` for the root
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Path of the parent module; `None` for the root
    pub fn parent(&self) -> Option<ModulePath> {
        if self.is_root() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].iter().cloned().collect()))
    }

    /// Path extended by one child name
    pub fn child(&self, name: impl Into<String>) -> ModulePath {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// True if `self` equals `other` or lies underneath it
    pub fn starts_with(&self, other: &ModulePath) -> bool {
        self.0.len() >= other.0.len() && self.0[..other.0.len()] == other.0[..]
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "<root>");
        }
        write!(f, "{}", self.0.join("."))
    }
}

/// A bare string is a single-segment path, like `register_module("cart", ..)`.
impl From<&str> for ModulePath {
    fn from(name: &str) -> Self {
        Self::from_segments([name])
    }
}

impl From<String> for ModulePath {
    fn from(name: String) -> Self {
        Self::from_segments([name])
    }
}

impl From<&[&str]> for ModulePath {
    fn from(segments: &[&str]) -> Self {
        Self::from_segments(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for ModulePath {
    fn from(segments: [&str; N]) -> Self {
        Self::from_segments(segments)
    }
}

impl From<Vec<String>> for ModulePath {
    fn from(segments: Vec<String>) -> Self {
        Self::from_segments(segments)
    }
}

impl From<&ModulePath> for ModulePath {
    fn from(path: &ModulePath) -> Self {
        path.clone()
    }
}

// =============================================================================
// Namespace
// =============================================================================

/// Handler type prefix derived from a module path
///
/// Every namespaced module on the path contributes `name/`; modules that are not
/// namespaced contribute nothing. The root namespace is the empty string.
///
/// Format: `"a/b/"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace(String);

impl Namespace {
    /// The root (empty) namespace
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Wrap an already-derived namespace string
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    /// Append a namespaced segment
    pub fn push(&mut self, name: &str) {
        self.0.push_str(name);
        self.0.push(NAMESPACE_SEPARATOR);
    }

    /// True for the empty namespace
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw prefix
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Qualify a local handler type: `namespace + local`
    pub fn qualify(&self, local: &str) -> String {
        let mut qualified = String::with_capacity(self.0.len() + local.len());
        qualified.push_str(&self.0);
        qualified.push_str(local);
        qualified
    }

    /// Strip this namespace from a qualified type, if it is a prefix
    pub fn localize<'a>(&self, qualified: &'a str) -> Option<&'a str> {
        qualified.strip_prefix(self.0.as_str())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Call
// =============================================================================

/// A normalized commit or dispatch request
///
/// Both call shapes accepted by the store reduce to this:
/// - type + payload: `Call::new("cart/addItem", json!({"id": 1}))`
/// - object style: `Call::object(json!({"type": "cart/addItem", "id": 1}))`,
///   where the whole object becomes the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    /// Handler type, possibly namespace-qualified
    #[serde(rename = "type")]
    pub kind: String,
    /// Payload handed to every matched handler
    pub payload: Value,
}

impl Call {
    /// Create a call from a type and a payload
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Create an object-style call
    ///
    /// # Errors
    /// Returns `StoreError::InvalidCall` if the object has no string `type` field.
    pub fn object(value: Value) -> Result<Self> {
        match value.get("type") {
            Some(Value::String(kind)) => Ok(Self {
                kind: kind.clone(),
                payload: value,
            }),
            Some(other) => Err(StoreError::InvalidCall(format!(
                "expects string as the type, but found {}",
                value_type_name(other)
            ))),
            None => Err(StoreError::InvalidCall(
                "object-style call requires a \"type\" field".to_string(),
            )),
        }
    }

    /// Same payload with a different type
    pub fn with_kind(self, kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: self.payload,
        }
    }
}

impl From<&str> for Call {
    fn from(kind: &str) -> Self {
        Self::new(kind, Value::Null)
    }
}

impl<S: Into<String>> From<(S, Value)> for Call {
    fn from((kind, payload): (S, Value)) -> Self {
        Self::new(kind, payload)
    }
}

/// JSON type name used in diagnostics
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// StateChange
// =============================================================================

/// What kind of write produced a state change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// Mutation handlers ran for this type
    Mutation(String),
    /// The whole root state was replaced
    Replace,
    /// A module's state was attached under its parent
    ModuleAttached,
    /// A module's state was removed from its parent
    ModuleDetached,
    /// Handlers were hot-swapped; observers must re-evaluate
    HotReload,
    /// A write that bypassed the guarded commit path
    Unguarded,
}

/// A write to the root state, delivered synchronously to deep watchers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// Kind of write
    pub kind: ChangeKind,
    /// Module path the write was scoped to (root for whole-tree writes)
    pub path: ModulePath,
    /// The write was made inside a guarded commit
    pub guarded: bool,
}

impl StateChange {
    /// Change produced by a commit
    pub fn mutation(kind: impl Into<String>) -> Self {
        Self::whole(ChangeKind::Mutation(kind.into()))
    }

    /// Change scoped to a module path
    pub fn at(kind: ChangeKind, path: ModulePath) -> Self {
        Self {
            kind,
            path,
            guarded: false,
        }
    }

    /// Change covering the whole tree
    pub fn whole(kind: ChangeKind) -> Self {
        Self::at(kind, ModulePath::root())
    }

    /// Mark the write as made inside a guarded commit
    pub fn guarded(mut self) -> Self {
        self.guarded = true;
        self
    }
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ChangeKind::Mutation(kind) => write!(f, "mutation {}", kind),
            ChangeKind::Replace => write!(f, "state replaced"),
            ChangeKind::ModuleAttached => write!(f, "module {} attached", self.path),
            ChangeKind::ModuleDetached => write!(f, "module {} detached", self.path),
            ChangeKind::HotReload => write!(f, "hot reload"),
            ChangeKind::Unguarded => write!(f, "unguarded write at {}", self.path),
        }
    }
}

//! Nested state access over `serde_json::Value`
//!
//! The state tree mirrors the module tree: a module at path `[a, b]` owns the
//! object found at `root["a"]["b"]`. These helpers walk module paths through a
//! state value.
//!
//! Only objects are traversed; a path that runs into a scalar, an array or a
//! missing key resolves to `None`.

use crate::types::ModulePath;
use serde_json::{Map, Value};

/// Empty state object
pub fn empty_state() -> Value {
    Value::Object(Map::new())
}

/// Get the state at `path`
///
/// # Returns
///
/// * `Some(&Value)` - The state object for the module at `path`
/// * `None` - If a segment is missing or a non-object is traversed
pub fn get_nested<'a>(root: &'a Value, path: &ModulePath) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Get mutable state at `path`
pub fn get_nested_mut<'a>(root: &'a mut Value, path: &ModulePath) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in path.segments() {
        current = current.as_object_mut()?.get_mut(segment)?;
    }
    Some(current)
}

/// Outcome of attaching a child state to its parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attach {
    /// Field did not exist before
    Inserted,
    /// Field existed and was replaced
    Overridden,
    /// The parent path does not resolve to an object
    ParentUnreachable,
}

/// Attach `state` as field `name` of the object at `parent`
///
/// Last write wins: an existing field is replaced and reported as
/// [`Attach::Overridden`].
pub fn attach_child(root: &mut Value, parent: &ModulePath, name: &str, state: Value) -> Attach {
    let Some(Value::Object(fields)) = get_nested_mut(root, parent) else {
        return Attach::ParentUnreachable;
    };
    match fields.insert(name.to_string(), state) {
        Some(_) => Attach::Overridden,
        None => Attach::Inserted,
    }
}

/// Remove field `name` from the object at `parent`, returning the removed state
pub fn detach_child(root: &mut Value, parent: &ModulePath, name: &str) -> Option<Value> {
    match get_nested_mut(root, parent)? {
        Value::Object(fields) => fields.remove(name),
        _ => None,
    }
}

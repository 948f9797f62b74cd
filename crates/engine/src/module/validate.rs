//! Definition shape checks
//!
//! Mutation and getter shapes are fixed by their handler types. What remains
//! checkable at runtime is the action object form: an entry created with
//! [`ActionDef::root_scoped`](super::ActionDef::root_scoped) must have a
//! handler attached before it is registered.
//!
//! Checks only run while the sink is enabled. Failing entries are reported
//! and skipped at install time; the rest of the definition is still used.

use super::definition::ModuleDefinition;
use statetree_core::{Diagnostic, DiagnosticSink, HandlerKind, ModulePath};

const ACTION_EXPECTED: &str = "function or object with \"handler\" function";

/// Check the handler tables of `definition` (not its nested modules)
///
/// Returns the number of problems reported.
pub fn assert_raw_module(
    path: &ModulePath,
    definition: &ModuleDefinition,
    sink: &dyn DiagnosticSink,
) -> usize {
    if !sink.enabled() {
        return 0;
    }
    let Some(actions) = definition.actions() else {
        return 0;
    };

    let mut reported = 0;
    for (key, action) in actions.iter() {
        if action.handler_fn().is_none() {
            sink.report(Diagnostic::InvalidHandlerShape {
                path: path.clone(),
                kind: HandlerKind::Action,
                key: key.to_string(),
                expected: ACTION_EXPECTED,
                found: if action.is_root() {
                    "object with \"root\" but no \"handler\"".to_string()
                } else {
                    "object without \"handler\"".to_string()
                },
            });
            reported += 1;
        }
    }
    reported
}

//! Store construction: module tree, state tree, plugins, configuration

use crate::common::*;
use statetree::{
    json, Diagnostic, ModuleDefinition, ModulePath, Namespace, Store, StoreConfig,
    CONFIG_FILE_NAME,
};

fn nested_root() -> ModuleDefinition {
    ModuleDefinition::new()
        .state(json!({"app": "shop"}))
        .module(
            "account",
            ModuleDefinition::new()
                .namespaced()
                .state(json!({"user": null}))
                .module(
                    "prefs",
                    ModuleDefinition::new().state(json!({"theme": "dark"})),
                ),
        )
        .module("cart", counter_module())
}

#[test]
fn state_reachable_along_module_path() {
    let store = reporting_store(nested_root());
    for path in [
        ModulePath::from("account"),
        ModulePath::from(["account", "prefs"]),
        ModulePath::from("cart"),
    ] {
        assert!(store.has_module(&path), "module {} missing", path);
        assert!(store.state_at(&path).is_some(), "state {} missing", path);
    }
    assert_eq!(store.state_at(["account", "prefs"]), Some(json!({"theme": "dark"})));
    assert_eq!(store.state()["app"], "shop");
}

#[test]
fn namespace_depends_on_namespaced_segments() {
    let store = reporting_store(nested_root());
    assert_eq!(store.module_namespace(ModulePath::root()), Some(Namespace::root()));
    assert_eq!(store.module_namespace("cart"), Some(Namespace::root()));
    assert_eq!(
        store.module_namespace(["account", "prefs"]),
        Some(Namespace::new("account/"))
    );
}

#[test]
fn object_form_action_without_handler_is_reported_and_skipped() {
    let root = ModuleDefinition::new().module(
        "broken",
        ModuleDefinition::new().action("load", statetree::ActionDef::root_scoped()),
    );
    let store = reporting_store(root);
    let diagnostics = store.diagnostics().snapshot();
    let shape = diagnostics
        .iter()
        .find(|d| matches!(d, Diagnostic::InvalidHandlerShape { .. }))
        .expect("shape diagnostic");
    assert!(shape.to_string().contains("\"actions.load\""));
    assert!(shape.to_string().contains("in module \"broken\""));
}

#[test]
fn duplicate_namespace_is_reported() {
    // a non-namespaced parent lets two namespaced modules derive "x/"
    let root = ModuleDefinition::new()
        .module("x", ModuleDefinition::new().namespaced())
        .module(
            "wrapper",
            ModuleDefinition::new().module("x", ModuleDefinition::new().namespaced()),
        );
    let store = reporting_store(root);
    assert!(store
        .diagnostics()
        .any(|d| matches!(d, Diagnostic::DuplicateNamespace { .. })));
}

#[test]
fn sibling_with_same_name_overwrites() {
    let root = ModuleDefinition::new()
        .module("a", ModuleDefinition::new().state(json!({"v": 1})))
        .module("a", ModuleDefinition::new().state(json!({"v": 2})));
    let store = reporting_store(root);
    assert_eq!(store.state()["a"], json!({"v": 2}));
}

#[test]
fn plugin_can_subscribe_before_first_commit() {
    let log = EventLog::new();
    let sink = log.clone();
    let store = Store::builder(counter_module())
        .config(reporting_config())
        .plugin(move |store| {
            let sink = sink.clone();
            store.subscribe(move |mutation, _| sink.push(mutation.kind.clone()));
        })
        .build();
    store.commit("inc", json!(1));
    assert_eq!(log.events(), vec!["inc"]);
}

#[test]
fn config_file_drives_strict_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "strict = true\nassertions = \"report\"\ndiagnostics = true\n").unwrap();

    let config = StoreConfig::load(&path).unwrap();
    let store = Store::builder(counter_module()).config(config).build();
    assert!(store.is_strict());
}

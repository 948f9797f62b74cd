//! Store Integration Tests
//!
//! End-to-end behavior of the public store surface: module installation,
//! namespacing, commit and dispatch pipelines, getters, dynamic modules,
//! hot reload, strict mode and subscriptions.

#[path = "../common/mod.rs"]
mod common;

mod cart_scenario;
mod commit_pipeline;
mod construction;
mod getters;
mod hot_reload;
mod namespacing;
mod strict_mode;
mod subscriptions;

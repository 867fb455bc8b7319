//! Foreign-key dependency graph and creation order
//!
//! This crate handles:
//! - Building the table dependency graph from extracted definitions
//! - Resolving a deterministic creation order with cycle reporting
//! - Writing and reading the dependency order artifacts

pub mod dag;
pub mod artifacts;

pub use dag::{DependencyGraph, Resolution, TableName};
pub use artifacts::{GraphError, load_order, render_report, write_artifacts, order_to_json, ORDER_FILE, REPORT_FILE};

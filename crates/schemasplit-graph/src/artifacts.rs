//! Dependency order artifacts
//!
//! `dependency_order.json` is the machine-readable order consumed by the
//! splitter and the validator; `dependency_report.txt` is for humans.

use crate::dag::{DependencyGraph, Resolution, TableName};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const ORDER_FILE: &str = "dependency_order.json";
pub const REPORT_FILE: &str = "dependency_report.txt";

/// Artifact error types
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid dependency order in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Render the order as a pretty JSON array
pub fn order_to_json(order: &[TableName]) -> String {
    // Serializing a list of strings cannot fail
    serde_json::to_string_pretty(order).unwrap_or_else(|_| "[]".to_string())
}

/// Render the human-readable dependency report
pub fn render_report(graph: &DependencyGraph, resolution: &Resolution) -> String {
    let mut report = String::from("Dependency order (parent -> child):\n");

    for (idx, table) in resolution.order.iter().enumerate() {
        let deps = graph
            .dependencies(table)
            .into_iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let deps = if deps.is_empty() { "none" } else { deps.as_str() };
        let _ = writeln!(report, "{:02}. {} -> depends on {}", idx + 1, table, deps);
    }

    report.push('\n');
    if resolution.cycles.is_empty() {
        report.push_str("No cycles detected.\n");
    } else {
        report.push_str("Cycles detected:\n");
        for cycle in &resolution.cycles {
            report.push_str(&cycle.join(" -> "));
            report.push('\n');
        }
    }

    report
}

/// Write both artifacts into a reports directory
pub fn write_artifacts(
    reports_dir: &Path,
    graph: &DependencyGraph,
    resolution: &Resolution,
) -> Result<(), GraphError> {
    std::fs::create_dir_all(reports_dir).map_err(|source| GraphError::Io {
        path: reports_dir.to_path_buf(),
        source,
    })?;

    let order_path = reports_dir.join(ORDER_FILE);
    std::fs::write(&order_path, order_to_json(&resolution.order))
        .map_err(|source| GraphError::Io { path: order_path.clone(), source })?;

    let report_path = reports_dir.join(REPORT_FILE);
    std::fs::write(&report_path, render_report(graph, resolution))
        .map_err(|source| GraphError::Io { path: report_path.clone(), source })?;

    tracing::info!(
        tables = resolution.order.len(),
        cycles = resolution.cycles.len(),
        dir = %reports_dir.display(),
        "wrote dependency artifacts"
    );
    Ok(())
}

/// Read a previously written `dependency_order.json`
pub fn load_order(path: &Path) -> Result<Vec<TableName>, GraphError> {
    let json = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&json).map_err(|source| GraphError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::{BTreeMap, BTreeSet};

    fn sample() -> (DependencyGraph, Resolution) {
        let mut edges: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        edges.insert("roles".into(), BTreeSet::new());
        edges.insert(
            "role_permissions".into(),
            ["permissions", "roles"].iter().map(|s| s.to_string()).collect(),
        );
        edges.insert("permissions".into(), BTreeSet::new());
        edges.insert("a".into(), ["b".to_string()].into_iter().collect());
        edges.insert("b".into(), ["a".to_string()].into_iter().collect());

        let graph = DependencyGraph::from_edges(edges);
        let resolution = graph.resolve();
        (graph, resolution)
    }

    #[test]
    fn report_lists_positions_and_cycles() {
        let (graph, resolution) = sample();
        let report = render_report(&graph, &resolution);

        let expected = "\
Dependency order (parent -> child):
01. b -> depends on a
02. a -> depends on b
03. permissions -> depends on none
04. roles -> depends on none
05. role_permissions -> depends on permissions, roles

Cycles detected:
a -> b -> a
";
        assert_eq!(report, expected);
    }

    #[test]
    fn report_without_cycles() {
        let graph = DependencyGraph::default();
        let report = render_report(&graph, &graph.resolve());
        assert_eq!(report, "Dependency order (parent -> child):\n\nNo cycles detected.\n");
    }

    #[test]
    fn order_survives_disk() {
        let dir = tempfile::tempdir().unwrap();
        let (graph, resolution) = sample();

        write_artifacts(dir.path(), &graph, &resolution).unwrap();
        let loaded = load_order(&dir.path().join(ORDER_FILE)).unwrap();
        assert_eq!(loaded, resolution.order);
    }

    #[test]
    fn malformed_order_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ORDER_FILE);
        std::fs::write(&path, "{ not a list").unwrap();
        assert!(matches!(load_order(&path), Err(GraphError::Json { .. })));
    }
}

//! Dependency graph construction and traversal
//!
//! Builds the foreign-key graph of extracted tables and resolves it into a
//! creation order where every table comes after the tables it references.

use schemasplit_sql::TableDefinition;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// Table name
pub type TableName = String;

/// Foreign-key dependency graph
///
/// Immutable once built. Only tables with a CREATE TABLE statement are nodes;
/// referenced tables that are not nodes stay as dangling edge targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// Forward edges: table -> tables it references
    edges: BTreeMap<TableName, BTreeSet<TableName>>,
}

impl DependencyGraph {
    /// Build the graph from extracted table definitions
    pub fn from_tables<'a, I>(tables: I) -> Self
    where
        I: IntoIterator<Item = &'a TableDefinition>,
    {
        let mut edges = BTreeMap::new();

        for table in tables {
            if !table.has_structure() {
                debug!(table = %table.name, "no CREATE TABLE, not a graph node");
                continue;
            }
            edges.insert(table.name.clone(), table.dependencies());
        }

        Self { edges }
    }

    /// Build the graph from explicit edges
    pub fn from_edges(edges: BTreeMap<TableName, BTreeSet<TableName>>) -> Self {
        Self { edges }
    }

    /// All nodes in lexical order
    pub fn nodes(&self) -> impl Iterator<Item = &TableName> {
        self.edges.keys()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.edges.contains_key(table)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of distinct edges
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|deps| deps.len()).sum()
    }

    /// Direct dependencies of a table, in lexical order
    pub fn dependencies(&self, table: &str) -> Vec<&TableName> {
        self.edges
            .get(table)
            .map(|deps| deps.iter().collect())
            .unwrap_or_default()
    }

    /// Referenced tables that are not nodes, with the tables referencing them
    pub fn dangling_references(&self) -> BTreeMap<&TableName, Vec<&TableName>> {
        let mut dangling: BTreeMap<&TableName, Vec<&TableName>> = BTreeMap::new();
        for (table, deps) in &self.edges {
            for dep in deps.iter().filter(|dep| !self.contains(dep)) {
                dangling.entry(dep).or_default().push(table);
            }
        }
        dangling
    }

    /// Resolve the graph into a creation order
    ///
    /// Depth-first, post-order, over nodes and their dependencies in lexical
    /// order. Uses an explicit stack. A back edge to a table still on the
    /// current path is recorded as a cycle and not followed; the order is
    /// produced regardless.
    pub fn resolve(&self) -> Resolution {
        let mut state: HashMap<&str, VisitState> = HashMap::with_capacity(self.edges.len());
        let mut order = Vec::with_capacity(self.edges.len());
        let mut cycles = Vec::new();

        for root in self.edges.keys() {
            if state.contains_key(root.as_str()) {
                continue;
            }

            state.insert(root, VisitState::InProgress);
            let mut path = vec![Frame::new(root, &self.edges[root])];

            while let Some(frame) = path.last_mut() {
                let Some(dep) = frame.next_dependency() else {
                    let table = frame.table;
                    path.pop();
                    state.insert(table, VisitState::Finished);
                    order.push(table.to_string());
                    continue;
                };

                let Some(dep_edges) = self.edges.get(dep) else {
                    continue;
                };

                match state.get(dep.as_str()).copied() {
                    Some(VisitState::Finished) => {}
                    Some(VisitState::InProgress) => {
                        let start = path.iter().position(|f| f.table == dep.as_str()).unwrap_or(0);
                        let mut cycle: Vec<TableName> =
                            path[start..].iter().map(|f| f.table.to_string()).collect();
                        cycle.push(dep.to_string());
                        warn!(cycle = %cycle.join(" -> "), "foreign key cycle");
                        cycles.push(cycle);
                    }
                    None => {
                        state.insert(dep, VisitState::InProgress);
                        path.push(Frame::new(dep, dep_edges));
                    }
                }
            }
        }

        debug!(tables = order.len(), cycles = cycles.len(), "resolved dependency order");
        Resolution { order, cycles }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Finished,
}

/// A table on the current traversal path
struct Frame<'g> {
    table: &'g str,
    deps: std::collections::btree_set::Iter<'g, TableName>,
}

impl<'g> Frame<'g> {
    fn new(table: &'g str, deps: &'g BTreeSet<TableName>) -> Self {
        Self {
            table,
            deps: deps.iter(),
        }
    }

    fn next_dependency(&mut self) -> Option<&'g TableName> {
        self.deps.next()
    }
}

/// Result of resolving a dependency graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Every node exactly once, dependencies first
    pub order: Vec<TableName>,

    /// Each cycle as a path that starts and ends on the same table
    pub cycles: Vec<Vec<TableName>>,
}

impl Resolution {
    /// 1-based position of a table in the order
    pub fn position(&self, table: &str) -> Option<usize> {
        self.order.iter().position(|t| t == table).map(|i| i + 1)
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Whether two tables appear together in a reported cycle
    pub fn in_same_cycle(&self, a: &str, b: &str) -> bool {
        self.cycles
            .iter()
            .any(|cycle| cycle.iter().any(|t| t == a) && cycle.iter().any(|t| t == b))
    }
}

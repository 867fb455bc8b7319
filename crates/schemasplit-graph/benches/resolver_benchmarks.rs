//! Benchmarks for dependency resolution
//!
//! Measures the resolver on large synthetic schemas: long FK chains (deep
//! traversal paths) and wide fan-in graphs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use schemasplit_graph::DependencyGraph;
use std::collections::{BTreeMap, BTreeSet};

/// Each table references the previous two
fn chain_graph(num_tables: usize) -> DependencyGraph {
    let mut edges = BTreeMap::new();
    for i in 0..num_tables {
        let deps: BTreeSet<String> = (i.saturating_sub(2)..i)
            .map(|j| format!("table_{:06}", j))
            .collect();
        edges.insert(format!("table_{:06}", i), deps);
    }
    DependencyGraph::from_edges(edges)
}

/// Every table references the same handful of hub tables
fn fan_in_graph(num_tables: usize) -> DependencyGraph {
    let hubs: BTreeSet<String> = (0..5).map(|h| format!("hub_{}", h)).collect();
    let mut edges: BTreeMap<String, BTreeSet<String>> =
        hubs.iter().map(|h| (h.clone(), BTreeSet::new())).collect();
    for i in 0..num_tables {
        edges.insert(format!("leaf_{:06}", i), hubs.clone());
    }
    DependencyGraph::from_edges(edges)
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for size in [100, 1_000, 10_000] {
        let chain = chain_graph(size);
        group.bench_with_input(BenchmarkId::new("chain", size), &chain, |b, graph| {
            b.iter(|| black_box(graph.resolve()))
        });

        let fan_in = fan_in_graph(size);
        group.bench_with_input(BenchmarkId::new("fan_in", size), &fan_in, |b, graph| {
            b.iter(|| black_box(graph.resolve()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);

//! Benchmark: dependency graph build and scheduling
//!
//! Measures DependencyGraph construction, cycle detection and Kahn sort.
//! Run: cargo bench --bench dag_build

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sdp::{topological_sort, DependencyGraph, WorkstreamNode};

/// ws_0 -> ws_1 -> ws_2 -> ...
fn linear(size: usize) -> Vec<WorkstreamNode> {
    (0..size)
        .map(|i| {
            let node = WorkstreamNode::new(format!("ws_{i}"), "F");
            if i == 0 {
                node
            } else {
                node.with_prerequisites([format!("ws_{}", i - 1)])
            }
        })
        .collect()
}

/// source -> (middle_0..middle_n) -> sink
fn diamond(width: usize) -> Vec<WorkstreamNode> {
    let mut nodes = vec![WorkstreamNode::new("source", "F")];
    nodes.extend((0..width).map(|i| {
        WorkstreamNode::new(format!("middle_{i}"), "F").with_prerequisites(["source"])
    }));
    nodes.push(
        WorkstreamNode::new("sink", "F")
            .with_prerequisites((0..width).map(|i| format!("middle_{i}"))),
    );
    nodes
}

/// Independent workstreams
fn parallel(size: usize) -> Vec<WorkstreamNode> {
    (0..size)
        .map(|i| WorkstreamNode::new(format!("ws_{i}"), "F"))
        .collect()
}

fn bench_graph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("dependency_graph_build");

    for size in [10, 50, 100, 250].iter() {
        let nodes = linear(*size);
        group.bench_with_input(BenchmarkId::new("linear", size), &nodes, |b, n| {
            b.iter(|| black_box(DependencyGraph::build(black_box(n))))
        });
    }

    for width in [10, 50, 100].iter() {
        let nodes = diamond(*width);
        group.bench_with_input(BenchmarkId::new("diamond", width), &nodes, |b, n| {
            b.iter(|| black_box(DependencyGraph::build(black_box(n))))
        });
    }

    for size in [10, 100, 250].iter() {
        let nodes = parallel(*size);
        group.bench_with_input(BenchmarkId::new("parallel", size), &nodes, |b, n| {
            b.iter(|| black_box(DependencyGraph::build(black_box(n))))
        });
    }

    group.finish();
}

fn bench_topological_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("topological_sort");

    for size in [10, 50, 100, 250].iter() {
        let graph = DependencyGraph::build(&linear(*size)).unwrap();
        group.bench_with_input(BenchmarkId::new("linear", size), &graph, |b, g| {
            b.iter(|| black_box(topological_sort(black_box(g))))
        });
    }

    for width in [10, 50, 100].iter() {
        let graph = DependencyGraph::build(&diamond(*width)).unwrap();
        group.bench_with_input(BenchmarkId::new("diamond", width), &graph, |b, g| {
            b.iter(|| black_box(topological_sort(black_box(g))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_graph_build, bench_topological_sort);
criterion_main!(benches);

//! Topological scheduling (Kahn's algorithm)

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use super::graph::DependencyGraph;
use crate::error::{Result, SdpError};

/// Compute a total execution order.
///
/// Ready nodes are taken in queue order, seeded in the graph's input order,
/// so identical inputs always yield identical orders. Fails with
/// `CircularDependency` if any node never becomes ready.
pub fn topological_sort(graph: &DependencyGraph) -> Result<Vec<String>> {
    let mut in_degree: FxHashMap<&str, usize> =
        FxHashMap::with_capacity_and_hasher(graph.len(), Default::default());
    let mut queue: VecDeque<&str> = VecDeque::new();

    for node in graph.nodes() {
        let id = node.workstream.id.as_str();
        in_degree.insert(id, node.in_degree);
        if node.in_degree == 0 {
            queue.push_back(id);
        }
    }

    let mut order = Vec::with_capacity(graph.len());
    while let Some(id) = queue.pop_front() {
        order.push(id.to_string());

        for dependent in graph.dependents(id) {
            if let Some(degree) = in_degree.get_mut(dependent.as_ref()) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    queue.push_back(dependent.as_ref());
                }
            }
        }
    }

    if order.len() < graph.len() {
        let blocked: Vec<&str> = graph
            .ids()
            .filter(|id| in_degree.get(id).is_some_and(|d| *d > 0))
            .collect();
        return Err(SdpError::CircularDependency {
            details: format!(
                "{} of {} workstreams never became ready: {}",
                blocked.len(),
                graph.len(),
                blocked.join(", ")
            ),
        });
    }

    Ok(order)
}

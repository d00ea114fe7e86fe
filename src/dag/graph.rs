//! DependencyGraph - workstream prerequisites as a directed graph
//!
//! Performance optimizations:
//! - Arc<str> for zero-cost cloning of workstream IDs
//! - FxHashMap for faster hashing (non-crypto)
//! - SmallVec for stack-allocated small dependent lists (0-4 items)
//!
//! Validation:
//! - Self-loops and unknown prerequisites rejected while linking
//! - Cycle detection using DFS three-color algorithm

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{Result, SdpError};
use crate::workstream::WorkstreamNode;

/// Stack-allocated dependents: most workstreams unblock 0-4 others
pub type DepVec = SmallVec<[Arc<str>; 4]>;

/// One workstream plus its derived reverse edges
#[derive(Debug, Clone)]
pub struct DependencyNode {
    pub workstream: WorkstreamNode,
    /// Workstreams whose prerequisites name this node
    pub dependents: DepVec,
    /// Number of prerequisites at build time
    pub in_degree: usize,
}

impl DependencyNode {
    /// Declared prerequisites of the wrapped workstream
    #[inline]
    pub fn prerequisites(&self) -> &[String] {
        &self.workstream.prerequisites
    }
}

/// Validated, acyclic graph of one feature's workstreams
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: FxHashMap<Arc<str>, DependencyNode>,
    /// Input order, used for deterministic iteration
    ids: Vec<Arc<str>>,
}

impl DependencyGraph {
    /// Build and validate the graph.
    ///
    /// Fails with `CircularDependency` on a self-loop or cycle, and with
    /// `MissingDependency` when a prerequisite is not part of the input.
    pub fn build(workstreams: &[WorkstreamNode]) -> Result<Self> {
        let graph = Self::link(workstreams)?;
        graph.detect_cycles()?;
        Ok(graph)
    }

    /// Create nodes and reverse edges without the cycle pass
    pub(crate) fn link(workstreams: &[WorkstreamNode]) -> Result<Self> {
        let capacity = workstreams.len();
        let mut nodes: FxHashMap<Arc<str>, DependencyNode> =
            FxHashMap::with_capacity_and_hasher(capacity, Default::default());
        let mut ids: Vec<Arc<str>> = Vec::with_capacity(capacity);

        for ws in workstreams {
            let id: Arc<str> = Arc::from(ws.id.as_str());
            if nodes.contains_key(&id) {
                return Err(SdpError::DuplicateWorkstream {
                    ws_id: ws.id.clone(),
                });
            }
            ids.push(Arc::clone(&id));
            nodes.insert(
                id,
                DependencyNode {
                    workstream: ws.clone(),
                    dependents: DepVec::new(),
                    in_degree: 0,
                },
            );
        }

        for (ws, id) in workstreams.iter().zip(&ids) {
            for dep in &ws.prerequisites {
                if dep == &ws.id {
                    return Err(SdpError::CircularDependency {
                        details: format!("workstream '{}' depends on itself", ws.id),
                    });
                }

                let dep_node = nodes
                    .get_mut(dep.as_str())
                    .ok_or_else(|| SdpError::MissingDependency {
                        ws_id: ws.id.clone(),
                        dep_id: dep.clone(),
                    })?;
                dep_node.dependents.push(Arc::clone(id));

                if let Some(node) = nodes.get_mut(id) {
                    node.in_degree += 1;
                }
            }
        }

        Ok(Self { nodes, ids })
    }

    /// Detect cycles using DFS with three-color marking over dependent edges
    ///
    /// Returns Err(CircularDependency) with the cycle path if found
    pub fn detect_cycles(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut colors: FxHashMap<Arc<str>, Color> = self
            .ids
            .iter()
            .map(|id| (Arc::clone(id), Color::White))
            .collect();
        // (node, index of the next dependent to visit); the path is the frame list
        let mut frames: Vec<(Arc<str>, usize)> = Vec::new();

        for root in &self.ids {
            if colors.get(root) != Some(&Color::White) {
                continue;
            }
            colors.insert(Arc::clone(root), Color::Gray);
            frames.push((Arc::clone(root), 0));

            while let Some((node, next_idx)) = frames.last_mut() {
                let dependents = self.dependents(&**node);
                let Some(next) = dependents.get(*next_idx).cloned() else {
                    colors.insert(Arc::clone(node), Color::Black);
                    frames.pop();
                    continue;
                };
                *next_idx += 1;

                match colors.get(&next).copied() {
                    Some(Color::Gray) => {
                        let start = frames
                            .iter()
                            .position(|(id, _)| id.as_ref() == next.as_ref())
                            .unwrap_or(0);
                        let cycle: Vec<&str> =
                            frames[start..].iter().map(|(id, _)| id.as_ref()).collect();
                        return Err(SdpError::CircularDependency {
                            details: format!("cycle {} -> {}", cycle.join(" -> "), next),
                        });
                    }
                    Some(Color::White) | None => {
                        colors.insert(Arc::clone(&next), Color::Gray);
                        frames.push((next, 0));
                    }
                    Some(Color::Black) => {}
                }
            }
        }

        Ok(())
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&DependencyNode> {
        self.nodes.get(id)
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Dependents of a node (empty for unknown ids)
    pub fn dependents(&self, id: &str) -> &[Arc<str>] {
        static EMPTY: &[Arc<str>] = &[];
        self.nodes
            .get(id)
            .map_or(EMPTY, |n| n.dependents.as_slice())
    }

    /// Node ids in input order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(|id| id.as_ref())
    }

    /// Nodes in input order
    pub fn nodes(&self) -> impl Iterator<Item = &DependencyNode> {
        self.ids.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Total prerequisite edges
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.dependents.len()).sum()
    }
}

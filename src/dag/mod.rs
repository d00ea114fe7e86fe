//! DAG Module - workstream dependency graph and scheduling
//!
//! - `graph`: DependencyGraph built from a flat workstream list
//! - `schedule`: total execution order via Kahn's algorithm
//!
//! Both are pure and synchronous. A graph is immutable after construction
//! and rebuilt for every run or resume.

mod graph;
mod schedule;

pub use graph::{DepVec, DependencyGraph, DependencyNode};
pub use schedule::topological_sort;

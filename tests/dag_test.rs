//! DAG Integration Tests
//!
//! Graph construction errors and execution order for realistic shapes.

use pretty_assertions::assert_eq;

use sdp::dag::{topological_sort, DependencyGraph};
use sdp::error::SdpError;
use sdp::workstream::WorkstreamNode;

fn ws(id: &str, deps: &[&str]) -> WorkstreamNode {
    WorkstreamNode::new(id, "F01").with_prerequisites(deps.iter().copied())
}

fn order(nodes: &[WorkstreamNode]) -> Vec<String> {
    let graph = DependencyGraph::build(nodes).unwrap();
    topological_sort(&graph).unwrap()
}

fn position(order: &[String], id: &str) -> usize {
    order.iter().position(|x| x == id).unwrap()
}

// ═══════════════════════════════════════════════════════════════
// ORDERING
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_diamond_order() {
    // A → B, A → C, B → D, C → D
    let nodes = [
        ws("A", &[]),
        ws("B", &["A"]),
        ws("C", &["A"]),
        ws("D", &["B", "C"]),
    ];
    assert_eq!(order(&nodes), vec!["A", "B", "C", "D"]);
}

#[test]
fn test_input_out_of_order_still_respects_edges() {
    let nodes = [ws("ws-3", &["ws-2"]), ws("ws-2", &["ws-1"]), ws("ws-1", &[])];
    assert_eq!(order(&nodes), vec!["ws-1", "ws-2", "ws-3"]);
}

#[test]
fn test_two_independent_chains() {
    let nodes = [
        ws("a1", &[]),
        ws("b1", &[]),
        ws("a2", &["a1"]),
        ws("b2", &["b1"]),
        ws("join", &["a2", "b2"]),
    ];
    let result = order(&nodes);
    assert_eq!(result.len(), 5);
    assert!(position(&result, "a1") < position(&result, "a2"));
    assert!(position(&result, "b1") < position(&result, "b2"));
    assert_eq!(result.last().map(String::as_str), Some("join"));
}

#[test]
fn test_dependents_and_prerequisites() {
    let nodes = [ws("A", &[]), ws("B", &["A"]), ws("C", &["A"])];
    let graph = DependencyGraph::build(&nodes).unwrap();

    let dependents: Vec<&str> = graph.dependents("A").iter().map(|d| &**d).collect();
    assert_eq!(dependents, vec!["B", "C"]);
    assert_eq!(graph.get("B").unwrap().prerequisites(), &["A".to_string()]);
    assert_eq!(graph.edge_count(), 2);
    assert!(graph.dependents("unknown").is_empty());
}

// ═══════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_self_loop() {
    let err = DependencyGraph::build(&[ws("A", &["A"])]).unwrap_err();
    assert!(matches!(err, SdpError::CircularDependency { .. }));
    assert_eq!(err.code(), "SDP-010");
}

#[test]
fn test_three_node_cycle() {
    let nodes = [ws("A", &["C"]), ws("B", &["A"]), ws("C", &["B"])];
    let err = DependencyGraph::build(&nodes).unwrap_err();
    match err {
        SdpError::CircularDependency { details } => {
            assert!(details.contains("A"));
            assert!(details.contains("->"));
        }
        other => panic!("expected cycle, got {other}"),
    }
}

#[test]
fn test_missing_dependency() {
    let err = DependencyGraph::build(&[ws("B", &["A"])]).unwrap_err();
    match &err {
        SdpError::MissingDependency { ws_id, dep_id } => {
            assert_eq!(ws_id, "B");
            assert_eq!(dep_id, "A");
        }
        other => panic!("expected missing dependency, got {other}"),
    }
    assert!(!err.is_recoverable());
}

#[test]
fn test_cycle_behind_valid_prefix() {
    let nodes = [ws("root", &[]), ws("x", &["root", "y"]), ws("y", &["x"])];
    assert!(matches!(
        DependencyGraph::build(&nodes),
        Err(SdpError::CircularDependency { .. })
    ));
}

#[test]
fn test_cycle_path_text() {
    let nodes = [ws("A", &["C"]), ws("B", &["A"]), ws("C", &["B"])];
    match DependencyGraph::build(&nodes) {
        Err(SdpError::CircularDependency { details }) => {
            assert_eq!(details, "cycle A -> B -> C -> A");
        }
        other => panic!("expected cycle, got {other:?}"),
    }
}

fn long_chain(len: usize) -> Vec<WorkstreamNode> {
    (0..len)
        .map(|i| {
            let node = WorkstreamNode::new(format!("ws-{i}"), "F01");
            if i == 0 {
                node
            } else {
                node.with_prerequisites([format!("ws-{}", i - 1)])
            }
        })
        .collect()
}

#[test]
fn test_very_long_chain_builds_and_sorts() {
    let nodes = long_chain(100_000);
    let graph = DependencyGraph::build(&nodes).unwrap();
    let order = topological_sort(&graph).unwrap();

    assert_eq!(order.len(), 100_000);
    assert_eq!(order[0], "ws-0");
    assert_eq!(order[99_999], "ws-99999");
}

#[test]
fn test_very_long_cycle_is_reported() {
    let mut nodes = long_chain(100_000);
    nodes[0] = ws("ws-0", &["ws-99999"]);

    match DependencyGraph::build(&nodes) {
        Err(SdpError::CircularDependency { details }) => {
            assert!(details.starts_with("cycle ws-0 -> ws-1 -> "));
            assert!(details.ends_with("ws-99999 -> ws-0"));
        }
        other => panic!("expected cycle, got {:?}", other.map(|g| g.len())),
    }
}

//! Structural integrity checks for compiled graphs.
//!
//! A graph passes when it is acyclic, every Reference names a node in the
//! same graph, every referenced output slot is one the target operation
//! declares, and every node's inputs match its operation's contract.
//! All problems are collected; the check never stops at the first one.

use crate::error::GraphDefect;
use crate::graph::{InputValue, Node, NodeGraph};
use crate::ops::ParamKind;
use indexmap::IndexSet;
use unirig_core::NodeId;

/// Checker for graph invariants
#[derive(Debug, Clone)]
pub struct IntegrityChecker {
    /// Verify output indices against declared output counts
    pub check_output_bounds: bool,
    /// Verify inputs against each operation's parameter contract
    pub check_params: bool,
}

impl IntegrityChecker {
    /// Create a checker with every check enabled
    #[must_use]
    pub fn new() -> Self {
        Self {
            check_output_bounds: true,
            check_params: true,
        }
    }

    /// Set whether output indices are bounds-checked
    #[must_use]
    pub fn with_output_bounds(mut self, enabled: bool) -> Self {
        self.check_output_bounds = enabled;
        self
    }

    /// Set whether parameter contracts are checked
    #[must_use]
    pub fn with_params(mut self, enabled: bool) -> Self {
        self.check_params = enabled;
        self
    }

    /// Check a graph
    ///
    /// # Errors
    ///
    /// Returns every defect found
    pub fn check(&self, graph: &NodeGraph) -> Result<(), Vec<GraphDefect>> {
        let mut defects = Vec::new();

        for (id, node) in graph.iter() {
            self.check_references(graph, id, node, &mut defects);
            if self.check_params {
                Self::check_node_params(id, node, &mut defects);
            }
        }

        if let Some(cycle) = Self::find_cycle(graph) {
            defects.push(GraphDefect::Cycle { nodes: cycle });
        }

        if defects.is_empty() {
            Ok(())
        } else {
            Err(defects)
        }
    }

    fn check_references(
        &self,
        graph: &NodeGraph,
        id: &NodeId,
        node: &Node,
        defects: &mut Vec<GraphDefect>,
    ) {
        for (param, reference) in node.references() {
            let Some(target) = graph.get(&reference.node_id) else {
                defects.push(GraphDefect::DanglingReference {
                    node: id.clone(),
                    param: param.to_string(),
                    target: reference.node_id.clone(),
                });
                continue;
            };

            let available = target.operation.output_count();
            if self.check_output_bounds && reference.output_index >= available {
                defects.push(GraphDefect::OutputOutOfRange {
                    node: id.clone(),
                    param: param.to_string(),
                    target: reference.node_id.clone(),
                    output_index: reference.output_index,
                    available,
                });
            }
        }
    }

    fn check_node_params(id: &NodeId, node: &Node, defects: &mut Vec<GraphDefect>) {
        let spec = node.operation.spec();

        for param in spec.params {
            match node.input(param.name) {
                None if param.required => defects.push(GraphDefect::MissingParam {
                    node: id.clone(),
                    operation: spec.wire_name,
                    param: param.name,
                }),
                None => {}
                Some(value) => {
                    let matches = matches!(
                        (param.kind, value),
                        (ParamKind::Literal, InputValue::Literal(_))
                            | (ParamKind::Reference, InputValue::Reference(_))
                    );
                    if !matches {
                        defects.push(GraphDefect::WrongParamKind {
                            node: id.clone(),
                            param: param.name.to_string(),
                            expected: param.kind,
                        });
                    }
                }
            }
        }

        for name in node.inputs.keys() {
            if spec.param(name).is_none() {
                defects.push(GraphDefect::UnexpectedParam {
                    node: id.clone(),
                    operation: spec.wire_name,
                    param: name.clone(),
                });
            }
        }

        if !spec.exactly_one_of.is_empty() {
            let found = spec
                .exactly_one_of
                .iter()
                .filter(|name| node.inputs.contains_key(**name))
                .count();
            if found != 1 {
                defects.push(GraphDefect::ExclusiveParams {
                    node: id.clone(),
                    params: spec.exactly_one_of.to_vec(),
                    found,
                });
            }
        }
    }

    /// First cycle found by depth-first search over dependencies
    fn find_cycle(graph: &NodeGraph) -> Option<Vec<NodeId>> {
        let mut visited = IndexSet::new();
        let mut rec_stack = IndexSet::new();

        for node_id in graph.ids() {
            if Self::dfs_cycle(node_id, graph, &mut visited, &mut rec_stack) {
                return Some(rec_stack.into_iter().collect());
            }
        }

        None
    }

    fn dfs_cycle(
        node_id: &NodeId,
        graph: &NodeGraph,
        visited: &mut IndexSet<NodeId>,
        rec_stack: &mut IndexSet<NodeId>,
    ) -> bool {
        if rec_stack.contains(node_id) {
            return true;
        }
        if visited.contains(node_id) {
            return false;
        }

        visited.insert(node_id.clone());
        rec_stack.insert(node_id.clone());

        for dep_id in graph.dependencies(node_id) {
            // Dangling targets are reported separately
            if graph.contains(&dep_id) && Self::dfs_cycle(&dep_id, graph, visited, rec_stack) {
                return true;
            }
        }

        rec_stack.shift_remove(node_id);
        false
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Literal, Reference};
    use crate::ops::Operation;

    fn id(n: u32) -> NodeId {
        NodeId::from_index(n)
    }

    fn load(source: &str) -> Node {
        Node::new(Operation::LoadRiggedMesh).with_input("source", Literal::from(source))
    }

    fn animate(from: Reference) -> Node {
        Node::new(Operation::ApplyAnimation)
            .with_input("model_fbx_path", from)
            .with_input("animation_file", Literal::from("idle.fbx"))
            .with_input("output_name", Literal::from("out"))
    }

    #[test]
    fn test_checker_new() {
        let checker = IntegrityChecker::new();
        assert!(checker.check_output_bounds);
        assert!(checker.check_params);
    }

    #[test]
    fn test_empty_graph_passes() {
        assert!(IntegrityChecker::new().check(&NodeGraph::new()).is_ok());
    }

    #[test]
    fn test_valid_chain_passes() {
        let mut graph = NodeGraph::new();
        graph.insert(id(1), load("r.fbx")).unwrap();
        graph.insert(id(2), animate(Reference::new(id(1), 0))).unwrap();
        assert!(IntegrityChecker::new().check(&graph).is_ok());
    }

    #[test]
    fn test_dangling_reference() {
        let mut graph = NodeGraph::new();
        graph.insert(id(2), animate(Reference::new(id(1), 0))).unwrap();
        let defects = IntegrityChecker::new().check(&graph).unwrap_err();
        assert_eq!(
            defects,
            vec![GraphDefect::DanglingReference {
                node: id(2),
                param: "model_fbx_path".to_string(),
                target: id(1),
            }]
        );
    }

    #[test]
    fn test_output_out_of_range() {
        let mut graph = NodeGraph::new();
        graph.insert(id(1), load("r.fbx")).unwrap();
        graph.insert(id(2), animate(Reference::new(id(1), 1))).unwrap();

        let defects = IntegrityChecker::new().check(&graph).unwrap_err();
        assert!(matches!(
            defects.as_slice(),
            [GraphDefect::OutputOutOfRange { output_index: 1, available: 1, .. }]
        ));

        let relaxed = IntegrityChecker::new().with_output_bounds(false);
        assert!(relaxed.check(&graph).is_ok());
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = NodeGraph::new();
        graph.insert(id(1), animate(Reference::new(id(2), 0))).unwrap();
        graph.insert(id(2), animate(Reference::new(id(1), 0))).unwrap();
        let defects = IntegrityChecker::new().check(&graph).unwrap_err();
        assert!(defects.iter().any(|d| matches!(d, GraphDefect::Cycle { nodes } if nodes.len() == 2)));
    }

    #[test]
    fn test_param_contract_violations_collected() {
        let mut graph = NodeGraph::new();
        graph.insert(id(1), load("r.fbx")).unwrap();
        graph
            .insert(
                id(2),
                Node::new(Operation::ApplyAnimation)
                    .with_input("model_fbx_path", Literal::from("r.fbx"))
                    .with_input("animation_file", Literal::from("a.fbx"))
                    .with_input("animation_url", Literal::from("b.fbx"))
                    .with_input("speed", Literal::from(2.0)),
            )
            .unwrap();

        let defects = IntegrityChecker::new().check(&graph).unwrap_err();
        assert_eq!(defects.len(), 4);
        assert!(defects.iter().any(|d| matches!(d, GraphDefect::WrongParamKind { param, .. } if param == "model_fbx_path")));
        assert!(defects.iter().any(|d| matches!(d, GraphDefect::MissingParam { param: "output_name", .. })));
        assert!(defects.iter().any(|d| matches!(d, GraphDefect::UnexpectedParam { param, .. } if param == "speed")));
        assert!(defects.iter().any(|d| matches!(d, GraphDefect::ExclusiveParams { found: 2, .. })));

        let structural_only = IntegrityChecker::new().with_params(false);
        assert!(structural_only.check(&graph).is_ok());
    }
}

//! Compiled workflows.

use serde::Serialize;
use unirig_graph::{CompilationDefect, GraphPlan, IntegrityChecker, Link, NodeGraph, Reference};

/// Graph ready for the engine, plus the output the caller gets back
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledWorkflow {
    /// Endpoint that produced the graph
    pub endpoint: &'static str,
    /// The graph
    pub graph: NodeGraph,
    /// Node and output slot holding the result
    pub terminal: Reference,
}

impl CompiledWorkflow {
    /// Assign ids, resolve the terminal link, and check integrity
    ///
    /// # Errors
    ///
    /// Returns error if the plan links forward or the graph fails the
    /// integrity check; both are compiler bugs
    pub fn finish(
        endpoint: &'static str,
        plan: GraphPlan,
        terminal: Link,
    ) -> Result<Self, CompilationDefect> {
        let graph = plan.assemble()?;
        let terminal = terminal.to_reference();

        if !graph.contains(&terminal.node_id) {
            return Err(CompilationDefect::Integrity(vec![
                unirig_graph::GraphDefect::DanglingReference {
                    node: terminal.node_id.clone(),
                    param: "<terminal>".to_string(),
                    target: terminal.node_id.clone(),
                },
            ]));
        }
        IntegrityChecker::new()
            .check(&graph)
            .map_err(CompilationDefect::Integrity)?;

        tracing::debug!(
            endpoint,
            nodes = graph.len(),
            terminal = %terminal.node_id,
            output = terminal.output_index,
            "compiled workflow"
        );

        Ok(Self {
            endpoint,
            graph,
            terminal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unirig_core::NodeId;
    use unirig_graph::Operation;

    #[test]
    fn test_finish_resolves_terminal() {
        let mut plan = GraphPlan::new();
        let fbx = plan.add(Operation::LoadRiggedMesh, [("source", "r.fbx".into())]);
        let compiled = CompiledWorkflow::finish("test", plan, fbx.output(0)).unwrap();
        assert_eq!(compiled.terminal, Reference::new(NodeId::from_index(1), 0));
        assert_eq!(compiled.graph.len(), 1);
    }

    #[test]
    fn test_finish_rejects_contract_violation() {
        let mut plan = GraphPlan::new();
        let fbx = plan.add(Operation::LoadRiggedMesh, [("path", "r.fbx".into())]);
        let err = CompiledWorkflow::finish("test", plan, fbx.output(0)).unwrap_err();
        assert!(matches!(err, CompilationDefect::Integrity(ref d) if d.len() == 2));
    }

    #[test]
    fn test_finish_rejects_terminal_outside_graph() {
        let mut other = GraphPlan::new();
        other.add(Operation::LoadRiggedMesh, [("source", "a".into())]);
        let stray = other.add(Operation::LoadRiggedMesh, [("source", "b".into())]);

        let mut plan = GraphPlan::new();
        plan.add(Operation::LoadRiggedMesh, [("source", "r.fbx".into())]);
        assert!(CompiledWorkflow::finish("test", plan, stray.output(0)).is_err());
    }
}

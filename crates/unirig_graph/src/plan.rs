//! Graph plans: build first, number later.
//!
//! Compilers append nodes to a [`GraphPlan`] and wire them through the
//! [`Slot`] handles `add` returns. Node ids are assigned in one pass by
//! [`GraphPlan::assemble`], in append order. A slot only exists once its
//! node has been appended, so append order is a topological order and
//! branches of different lengths can never collide on ids.

use crate::error::CompilationDefect;
use crate::graph::{InputValue, Literal, Node, NodeGraph, Reference};
use crate::ops::Operation;
use indexmap::IndexMap;
use unirig_core::NodeId;

/// Handle to a node appended to a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(usize);

impl Slot {
    /// Link to one positional output of this node
    #[must_use]
    pub const fn output(self, output_index: u32) -> Link {
        Link {
            slot: self,
            output_index,
        }
    }

    /// 0-based append position
    #[must_use]
    pub const fn position(self) -> usize {
        self.0
    }

    /// Id this slot receives on assembly
    #[must_use]
    pub fn node_id(self) -> NodeId {
        NodeId::from_index(self.0 as u32 + 1)
    }
}

/// Planned edge to a slot's output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    slot: Slot,
    output_index: u32,
}

impl Link {
    /// Producing slot
    #[must_use]
    pub const fn slot(self) -> Slot {
        self.slot
    }

    /// Positional output of the producing slot
    #[must_use]
    pub const fn output_index(self) -> u32 {
        self.output_index
    }

    /// Reference this link becomes once ids are assigned
    #[must_use]
    pub fn to_reference(self) -> Reference {
        Reference::new(self.slot.node_id(), self.output_index)
    }
}

/// Input of a planned node
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedInput {
    /// Literal value
    Literal(Literal),
    /// Edge to an earlier slot
    Link(Link),
}

impl From<Link> for PlannedInput {
    fn from(link: Link) -> Self {
        Self::Link(link)
    }
}

impl From<Literal> for PlannedInput {
    fn from(l: Literal) -> Self {
        Self::Literal(l)
    }
}

impl From<&str> for PlannedInput {
    fn from(s: &str) -> Self {
        Self::Literal(s.into())
    }
}

impl From<String> for PlannedInput {
    fn from(s: String) -> Self {
        Self::Literal(s.into())
    }
}

impl From<bool> for PlannedInput {
    fn from(b: bool) -> Self {
        Self::Literal(b.into())
    }
}

impl From<i64> for PlannedInput {
    fn from(n: i64) -> Self {
        Self::Literal(n.into())
    }
}

#[derive(Debug, Clone)]
struct PlannedNode {
    operation: Operation,
    inputs: IndexMap<String, PlannedInput>,
}

/// Ordered list of nodes awaiting id assignment
#[derive(Debug, Clone, Default)]
pub struct GraphPlan {
    nodes: Vec<PlannedNode>,
}

impl GraphPlan {
    /// Create an empty plan
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and get its slot
    pub fn add<I, K>(&mut self, operation: Operation, inputs: I) -> Slot
    where
        I: IntoIterator<Item = (K, PlannedInput)>,
        K: Into<String>,
    {
        let slot = Slot(self.nodes.len());
        self.nodes.push(PlannedNode {
            operation,
            inputs: inputs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        });
        slot
    }

    /// Number of planned nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if plan is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Slot the next `add` will return
    #[must_use]
    pub fn next_slot(&self) -> Slot {
        Slot(self.nodes.len())
    }

    /// Assign ids `1..=n` in append order and resolve links into references
    ///
    /// # Errors
    ///
    /// Returns error if a node links to itself or to a later slot
    pub fn assemble(self) -> Result<NodeGraph, CompilationDefect> {
        let mut graph = NodeGraph::new();

        for (position, planned) in self.nodes.into_iter().enumerate() {
            let id = Slot(position).node_id();
            let mut node = Node::new(planned.operation).with_title(planned.operation.spec().title);

            for (name, input) in planned.inputs {
                let value = match input {
                    PlannedInput::Literal(l) => InputValue::Literal(l),
                    PlannedInput::Link(link) => {
                        if link.slot.0 >= position {
                            return Err(CompilationDefect::ForwardLink {
                                position,
                                slot: link.slot.0,
                            });
                        }
                        InputValue::Reference(link.to_reference())
                    }
                };
                node.inputs.insert(name, value);
            }

            graph.insert(id, node)?;
        }

        Ok(graph)
    }
}

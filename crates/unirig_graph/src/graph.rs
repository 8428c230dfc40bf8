//! Node graph handed to the execution engine.
//!
//! On the wire a graph is a JSON object keyed by node id:
//!
//! ```json
//! {
//!   "1": {"operation": "UniRigLoadMesh", "inputs": {"source": "a.glb"}},
//!   "3": {"operation": "UniRigAutoRig", "inputs": {"trimesh": ["1", 0], "model": ["2", 0]}}
//! }
//! ```
//!
//! Literals are scalars only, so a two-element array is always a
//! [`Reference`].

use crate::error::CompilationDefect;
use crate::ops::Operation;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use unirig_core::NodeId;

/// "Output `output_index` of node `node_id`", encoded as `[node_id, output_index]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(NodeId, u32)", into = "(NodeId, u32)")]
pub struct Reference {
    /// Producing node
    pub node_id: NodeId,
    /// Positional output of the producing node
    pub output_index: u32,
}

impl Reference {
    /// Create a new reference
    #[must_use]
    pub fn new(node_id: NodeId, output_index: u32) -> Self {
        Self {
            node_id,
            output_index,
        }
    }
}

impl From<(NodeId, u32)> for Reference {
    fn from((node_id, output_index): (NodeId, u32)) -> Self {
        Self::new(node_id, output_index)
    }
}

impl From<Reference> for (NodeId, u32) {
    fn from(r: Reference) -> Self {
        (r.node_id, r.output_index)
    }
}

/// Scalar literal input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// Boolean flag
    Bool(bool),
    /// Integer
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// String
    String(String),
}

impl Literal {
    /// Convert a JSON scalar; arrays, objects and null have no literal form
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float)),
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }

    /// String content, if this is a string literal
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

/// Value bound to a node input: a Reference or a literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    /// Edge to another node's output
    Reference(Reference),
    /// Literal value
    Literal(Literal),
}

impl InputValue {
    /// The reference, if this input is an edge
    #[must_use]
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Self::Reference(r) => Some(r),
            Self::Literal(_) => None,
        }
    }

    /// The literal, if this input is not an edge
    #[must_use]
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(l) => Some(l),
            Self::Reference(_) => None,
        }
    }
}

impl From<Reference> for InputValue {
    fn from(r: Reference) -> Self {
        Self::Reference(r)
    }
}

impl From<Literal> for InputValue {
    fn from(l: Literal) -> Self {
        Self::Literal(l)
    }
}

/// Display metadata carried alongside a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Human-readable node title
    pub title: String,
}

/// An opaque unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Operation tag
    pub operation: Operation,
    /// Inputs by parameter name, in declaration order
    pub inputs: IndexMap<String, InputValue>,
    /// Optional display metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,
}

impl Node {
    /// Create a node with no inputs
    #[must_use]
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            inputs: IndexMap::new(),
            metadata: None,
        }
    }

    /// Bind an input
    #[must_use]
    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    /// Set the display title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata = Some(NodeMetadata {
            title: title.into(),
        });
        self
    }

    /// Input by parameter name
    #[must_use]
    pub fn input(&self, name: &str) -> Option<&InputValue> {
        self.inputs.get(name)
    }

    /// All references held by this node, with their parameter names
    pub fn references(&self) -> impl Iterator<Item = (&str, &Reference)> {
        self.inputs
            .iter()
            .filter_map(|(name, value)| value.as_reference().map(|r| (name.as_str(), r)))
    }
}

/// Mapping from node id to node
///
/// Built once per request and never mutated after it leaves the compiler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeGraph {
    nodes: IndexMap<NodeId, Node>,
}

impl NodeGraph {
    /// Create a new empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node
    ///
    /// # Errors
    ///
    /// Returns error if the id is already taken
    pub fn insert(&mut self, id: NodeId, node: Node) -> Result<(), CompilationDefect> {
        if self.nodes.contains_key(&id) {
            return Err(CompilationDefect::DuplicateNode { id });
        }
        self.nodes.insert(id, node);
        Ok(())
    }

    /// Get node by ID
    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Check if a node exists
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Node ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Get total node count
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes running the given operation
    pub fn nodes_with(&self, operation: Operation) -> impl Iterator<Item = (&NodeId, &Node)> {
        self.nodes.iter().filter(move |(_, n)| n.operation == operation)
    }

    /// Nodes that the given node depends on, deduplicated
    #[must_use]
    pub fn dependencies(&self, id: &NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(id) else {
            return Vec::new();
        };
        node.references()
            .map(|(_, r)| r.node_id.clone())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Nodes that depend on the given node
    #[must_use]
    pub fn dependents(&self, id: &NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.references().any(|(_, r)| &r.node_id == id))
            .map(|(nid, _)| nid.clone())
            .collect()
    }

    /// Highest conventional numeric id, if any node uses one
    #[must_use]
    pub fn max_index(&self) -> Option<u32> {
        self.nodes.keys().filter_map(NodeId::index).max()
    }

    /// Nodes no other node depends on
    #[must_use]
    pub fn sinks(&self) -> Vec<NodeId> {
        self.nodes
            .keys()
            .filter(|id| self.dependents(id).is_empty())
            .cloned()
            .collect()
    }

    /// Pretty JSON in the engine's wire format
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

//! Graph defects.
//!
//! Every variant here is a contract violation by a graph compiler, never
//! a consequence of user input. Validation rejects bad requests before a
//! compiler runs.

use crate::ops::ParamKind;
use unirig_core::NodeId;
use thiserror::Error;

/// A single structural problem found in a graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphDefect {
    /// Reference to a node that is not in the graph
    #[error("node '{node}' input '{param}' references missing node '{target}'")]
    DanglingReference {
        /// Node holding the reference
        node: NodeId,
        /// Input parameter holding the reference
        param: String,
        /// Referenced node
        target: NodeId,
    },

    /// Reference to an output slot the target operation does not produce
    #[error(
        "node '{node}' input '{param}' references output {output_index} of node '{target}', which has {available} outputs"
    )]
    OutputOutOfRange {
        /// Node holding the reference
        node: NodeId,
        /// Input parameter holding the reference
        param: String,
        /// Referenced node
        target: NodeId,
        /// Requested output slot
        output_index: u32,
        /// Outputs declared by the target operation
        available: u32,
    },

    /// Chain of references returning to its origin
    #[error("cycle detected involving nodes {nodes:?}")]
    Cycle {
        /// Nodes on the cycle, in traversal order
        nodes: Vec<NodeId>,
    },

    /// Required parameter absent
    #[error("node '{node}' ({operation}) is missing required input '{param}'")]
    MissingParam {
        /// Offending node
        node: NodeId,
        /// Operation wire name
        operation: &'static str,
        /// Missing parameter
        param: &'static str,
    },

    /// Parameter not declared by the operation
    #[error("node '{node}' ({operation}) has undeclared input '{param}'")]
    UnexpectedParam {
        /// Offending node
        node: NodeId,
        /// Operation wire name
        operation: &'static str,
        /// Undeclared parameter
        param: String,
    },

    /// Literal where a reference is declared, or the reverse
    #[error("node '{node}' input '{param}' must be a {expected}")]
    WrongParamKind {
        /// Offending node
        node: NodeId,
        /// Parameter name
        param: String,
        /// Declared kind
        expected: ParamKind,
    },

    /// Zero or several members of an exactly-one-of group present
    #[error("node '{node}' must set exactly one of {params:?}, found {found}")]
    ExclusiveParams {
        /// Offending node
        node: NodeId,
        /// Members of the group
        params: Vec<&'static str>,
        /// How many were present
        found: usize,
    },
}

/// Internal defect raised while building a graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompilationDefect {
    /// Two nodes share an id
    #[error("duplicate node id '{id}'")]
    DuplicateNode {
        /// Colliding id
        id: NodeId,
    },

    /// A planned node links to a slot that was not appended before it
    #[error("node at position {position} links to slot {slot}, which is not an earlier node")]
    ForwardLink {
        /// 0-based position of the linking node
        position: usize,
        /// 0-based slot that was linked
        slot: usize,
    },

    /// Compiled graph failed the integrity check
    #[error("compiled graph failed integrity check: {}", format_defects(.0))]
    Integrity(Vec<GraphDefect>),

    /// Validated request is missing a field its schema guarantees
    #[error("validated request is missing field '{field}'")]
    MissingField {
        /// Field name
        field: String,
    },
}

fn format_defects(defects: &[GraphDefect]) -> String {
    defects
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

//! UniRig API Execution Graphs
//!
//! Node graphs handed to the external inference engine: the Reference
//! edge marker, opaque nodes tagged with a closed set of operations, the
//! plan that assigns node ids in topological order, and the integrity
//! checker every compiled graph must pass.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod graph;
pub mod integrity;
pub mod ops;
pub mod plan;

pub use error::{CompilationDefect, GraphDefect};
pub use graph::{InputValue, Literal, Node, NodeGraph, NodeMetadata, Reference};
pub use integrity::IntegrityChecker;
pub use ops::{Operation, OperationSpec, ParamKind, ParamSpec};
pub use plan::{GraphPlan, Link, PlannedInput, Slot};

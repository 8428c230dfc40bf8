//! Reading the terminal output back out of an engine result.

use crate::compiled::CompiledWorkflow;
use crate::result::EngineResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use unirig_core::NodeId;

/// Response body of every workflow endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowOutput {
    /// Location of the produced file
    pub result_path: String,
    /// Engine execution time in seconds
    pub processing_time: f64,
}

/// The engine result does not hold the terminal output
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IncompleteResultError {
    /// Terminal node never ran
    #[error("terminal node {node} is missing from the engine result")]
    MissingNode {
        /// Terminal node
        node: NodeId,
    },

    /// Terminal node ran but produced too few outputs
    #[error("terminal node {node} produced {available} outputs, output {output_index} requested")]
    MissingOutput {
        /// Terminal node
        node: NodeId,
        /// Requested slot
        output_index: u32,
        /// Outputs actually produced
        available: usize,
    },

    /// Terminal output is not a usable path
    #[error("terminal output {node}[{output_index}] is not a non-empty string: {found}")]
    InvalidValue {
        /// Terminal node
        node: NodeId,
        /// Requested slot
        output_index: u32,
        /// Value found there
        found: String,
    },
}

/// Extract the terminal path and timing
///
/// # Errors
///
/// Returns error if the terminal output is absent or not a non-empty string
pub fn result_path(
    result: &EngineResult,
    workflow: &CompiledWorkflow,
) -> Result<WorkflowOutput, IncompleteResultError> {
    let terminal = &workflow.terminal;
    let node = result
        .node(&terminal.node_id)
        .ok_or_else(|| IncompleteResultError::MissingNode {
            node: terminal.node_id.clone(),
        })?;

    let value = node
        .get(terminal.output_index)
        .ok_or_else(|| IncompleteResultError::MissingOutput {
            node: terminal.node_id.clone(),
            output_index: terminal.output_index,
            available: node.outputs.len(),
        })?;

    match value.as_str() {
        Some(path) if !path.is_empty() => Ok(WorkflowOutput {
            result_path: path.to_string(),
            processing_time: result.execution_time,
        }),
        _ => Err(IncompleteResultError::InvalidValue {
            node: terminal.node_id.clone(),
            output_index: terminal.output_index,
            found: value.to_string(),
        }),
    }
}

//! Errors surfaced by a workflow endpoint.

use crate::extract::IncompleteResultError;
use thiserror::Error;
use unirig_graph::CompilationDefect;
use unirig_schema::ValidationError;

/// Any failure between a raw request and a typed response
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    /// Request rejected by its schema
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Compiler bug
    #[error(transparent)]
    Defect(#[from] CompilationDefect),

    /// Engine result lacks the terminal output
    #[error(transparent)]
    Incomplete(#[from] IncompleteResultError),
}

impl WorkflowError {
    /// Short machine-readable kind
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Defect(_) => "compilation_defect",
            Self::Incomplete(_) => "incomplete_result",
        }
    }

    /// True for errors caused by the caller's input
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

//! UniRig API Workflows
//!
//! One graph compiler per endpoint (rig, animate, fit-clothing), the
//! extractor that reads the terminal output back out of the engine's
//! result, and the registry tying each HTTP endpoint to its schema,
//! compiler and extractor.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod animate;
pub mod compiled;
pub mod error;
pub mod extract;
pub mod fit_clothing;
mod fields;
pub mod registry;
pub mod result;
pub mod rig;

pub use compiled::CompiledWorkflow;
pub use error::WorkflowError;
pub use extract::{IncompleteResultError, WorkflowOutput};
pub use registry::{EndpointDescriptor, EndpointRegistry, Method, RegistryBuilder, RegistryError};
pub use result::{EngineResult, NodeOutputs};

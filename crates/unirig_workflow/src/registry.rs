//! Endpoint registry: (method, path) to schema, compiler and extractor.
//!
//! The registry is assembled once through [`RegistryBuilder`] and has no
//! mutating methods afterwards. Callers share it behind an `Arc`.

use crate::compiled::CompiledWorkflow;
use crate::error::WorkflowError;
use crate::extract::{IncompleteResultError, WorkflowOutput};
use crate::result::EngineResult;
use crate::{animate, fit_clothing, rig};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use unirig_core::Timestamp;
use unirig_graph::CompilationDefect;
use unirig_schema::{RequestSchema, SchemaValidator, ValidatedRequest};

/// Validated request to graph
pub type Compiler = fn(&ValidatedRequest) -> Result<CompiledWorkflow, CompilationDefect>;

/// Engine result to typed response
pub type Extractor = fn(&EngineResult, &CompiledWorkflow) -> Result<WorkflowOutput, IncompleteResultError>;

/// HTTP method of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
}

impl Method {
    /// Upper-case method name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error while building the registry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Same method and path registered twice
    #[error("endpoint already registered: {method} {path}")]
    AlreadyRegistered {
        /// Method
        method: Method,
        /// Path
        path: &'static str,
    },

    /// A schema pattern failed to compile
    #[error("invalid field pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Everything needed to serve one endpoint
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    /// Method
    pub method: Method,
    /// Route path
    pub path: &'static str,
    /// One-line description
    pub summary: &'static str,
    /// Request shape
    pub schema: RequestSchema,
    /// Graph compiler
    pub compiler: Compiler,
    /// Output extractor
    pub extractor: Extractor,
}

impl EndpointDescriptor {
    /// Validate a raw body and compile it
    ///
    /// # Errors
    ///
    /// Returns error if validation fails or the compiler hits a defect
    pub fn compile(
        &self,
        validator: &SchemaValidator,
        raw: &Value,
        now: Timestamp,
    ) -> Result<CompiledWorkflow, WorkflowError> {
        let request = validator.validate(&self.schema, raw, now)?;
        Ok((self.compiler)(&request)?)
    }

    /// Extract the typed response from an engine result
    ///
    /// # Errors
    ///
    /// Returns error if the terminal output is missing
    pub fn extract(
        &self,
        result: &EngineResult,
        workflow: &CompiledWorkflow,
    ) -> Result<WorkflowOutput, WorkflowError> {
        Ok((self.extractor)(result, workflow)?)
    }
}

/// Immutable lookup of endpoint descriptors
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    endpoints: IndexMap<(Method, &'static str), EndpointDescriptor>,
}

impl EndpointRegistry {
    /// Start building a registry
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry with the rig, animate and fit-clothing endpoints
    ///
    /// # Errors
    ///
    /// Returns error if a descriptor fails to build
    pub fn standard() -> Result<Self, RegistryError> {
        Ok(Self::builder()
            .register(rig::descriptor()?)?
            .register(animate::descriptor()?)?
            .register(fit_clothing::descriptor()?)?
            .build())
    }

    /// Look up an endpoint
    #[must_use]
    pub fn get(&self, method: Method, path: &str) -> Option<&EndpointDescriptor> {
        self.endpoints
            .iter()
            .find(|((m, p), _)| *m == method && *p == path)
            .map(|(_, d)| d)
    }

    /// Descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.endpoints.values()
    }

    /// Number of endpoints
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Collects descriptors before the registry is frozen
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    endpoints: IndexMap<(Method, &'static str), EndpointDescriptor>,
}

impl RegistryBuilder {
    /// Add a descriptor
    ///
    /// # Errors
    ///
    /// Returns error if the method and path are already taken
    pub fn register(mut self, descriptor: EndpointDescriptor) -> Result<Self, RegistryError> {
        let key = (descriptor.method, descriptor.path);
        if self.endpoints.contains_key(&key) {
            return Err(RegistryError::AlreadyRegistered {
                method: descriptor.method,
                path: descriptor.path,
            });
        }
        self.endpoints.insert(key, descriptor);
        Ok(self)
    }

    /// Freeze into a registry
    #[must_use]
    pub fn build(self) -> EndpointRegistry {
        tracing::debug!(endpoints = self.endpoints.len(), "endpoint registry built");
        EndpointRegistry {
            endpoints: self.endpoints,
        }
    }
}

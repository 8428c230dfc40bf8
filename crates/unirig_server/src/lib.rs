//! UniRig API Server
//!
//! HTTP surface over the workflow registry: one route per registered
//! endpoint, a serverless job envelope at `/run`, and the client that
//! hands compiled graphs to the execution engine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod engine;
pub mod handler;
pub mod job;

pub use api::{router, ApiServer, AppState};
pub use config::{ConfigError, LogFormat, ServerConfig};
pub use engine::{wait_for_engine, EngineError, ExecutionEngine, HttpEngine};
pub use handler::{ApiError, ErrorBody};
pub use job::{Job, JobResponse};

//! Workflow request handling and error responses.

use crate::api::AppState;
use crate::engine::EngineError;
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::Instrument;
use unirig_core::{RequestId, Timestamp};
use unirig_graph::CompilationDefect;
use unirig_workflow::{Method, WorkflowError, WorkflowOutput};

/// Failure while serving a request
#[derive(Error, Debug)]
pub enum ApiError {
    /// Validation, compilation, or extraction failure
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Engine call failed
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Body is not JSON
    #[error("request body is not valid JSON: {0}")]
    MalformedBody(String),

    /// No endpoint at this method and path
    #[error("no endpoint {method} {path}")]
    UnknownEndpoint {
        /// Method
        method: String,
        /// Path
        path: String,
    },
}

/// JSON error body
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Error kind
    pub error: &'static str,
    /// Human-readable message
    pub message: String,
    /// Per-field or per-defect detail
    pub details: Vec<Value>,
}

impl ApiError {
    /// HTTP status for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Workflow(WorkflowError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Workflow(WorkflowError::Defect(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Workflow(WorkflowError::Incomplete(_)) => StatusCode::BAD_GATEWAY,
            Self::Engine(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Engine(_) => StatusCode::BAD_GATEWAY,
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::UnknownEndpoint { .. } => StatusCode::NOT_FOUND,
        }
    }

    /// Machine-readable kind
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Workflow(e) => e.kind(),
            Self::Engine(e) if e.is_timeout() => "engine_timeout",
            Self::Engine(_) => "engine_error",
            Self::MalformedBody(_) => "malformed_body",
            Self::UnknownEndpoint { .. } => "unknown_endpoint",
        }
    }

    /// Error body
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let details = match self {
            Self::Workflow(WorkflowError::Validation(v)) => v
                .errors
                .iter()
                .filter_map(|e| serde_json::to_value(e).ok())
                .collect(),
            Self::Workflow(WorkflowError::Defect(CompilationDefect::Integrity(defects))) => {
                defects.iter().map(|d| Value::String(d.to_string())).collect()
            }
            _ => Vec::new(),
        };
        ErrorBody {
            error: self.kind(),
            message: self.to_string(),
            details,
        }
    }

    fn log(&self) {
        match self {
            Self::Workflow(WorkflowError::Defect(_)) => tracing::error!(error = %self, "compilation defect"),
            Self::Engine(_) | Self::Workflow(WorkflowError::Incomplete(_)) => {
                tracing::warn!(error = %self, "engine failure")
            }
            _ => tracing::warn!(error = %self, "request rejected"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// Parse a body, treating an empty one as `{}`
///
/// # Errors
///
/// Returns error if the body is not JSON
pub fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::MalformedBody(e.to_string()))
}

/// Strip an `{"id"?, "input": {...}}` wrapper
#[must_use]
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("input").is_some_and(Value::is_object) => {
            map.remove("input").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Validate, compile, execute, and extract one workflow request
///
/// # Errors
///
/// Returns error at whichever stage fails
pub async fn dispatch(
    state: &AppState,
    method: Method,
    path: &str,
    body: Value,
) -> Result<WorkflowOutput, ApiError> {
    let descriptor = state
        .registry
        .get(method, path)
        .ok_or_else(|| ApiError::UnknownEndpoint {
            method: method.to_string(),
            path: path.to_string(),
        })?;

    let request = unwrap_envelope(body);
    let workflow = descriptor.compile(&state.validator, &request, Timestamp::now())?;
    tracing::debug!(nodes = workflow.graph.len(), "submitting graph");

    let result = state.engine.execute(&workflow.graph).await?;
    let output = descriptor.extract(&result, &workflow)?;

    tracing::info!(
        result_path = %output.result_path,
        processing_time = output.processing_time,
        "workflow complete"
    );
    Ok(output)
}

/// Axum entry point for a registered endpoint
pub async fn workflow(state: AppState, method: Method, path: &'static str, body: Bytes) -> Response {
    let request_id = RequestId::new();
    let span = tracing::info_span!("workflow", request_id = %request_id, endpoint = path);

    async move {
        let outcome = match parse_body(&body) {
            Ok(value) => dispatch(&state, method, path, value).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(output) => (StatusCode::OK, Json(output)).into_response(),
            Err(e) => {
                e.log();
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

//! `POST /run`: serverless job envelope.
//!
//! A job names an endpoint and a body:
//!
//! ```json
//! {"id": "job-1", "input": {"endpoint": "/workflow/rig-avatar", "body": {"mesh_url": "..."}}}
//! ```
//!
//! `endpoint` defaults to `/prompt`, which forwards the body to the engine
//! as a raw graph. Without a `body` member the rest of the `input` object,
//! minus `endpoint`, is the body. The reply always has status 200; the outcome is in the envelope.

use crate::api::AppState;
use crate::handler::{self, ApiError};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::Instrument;
use unirig_core::RequestId;
use unirig_workflow::Method;

/// Endpoint that forwards a raw graph
pub const RAW_PROMPT: &str = "/prompt";

/// Inbound job
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Job {
    /// Caller's job id
    #[serde(default)]
    pub id: Option<String>,
    /// Endpoint and body
    #[serde(default)]
    pub input: Map<String, Value>,
}

impl Job {
    /// Target endpoint path
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.input
            .get("endpoint")
            .and_then(Value::as_str)
            .unwrap_or(RAW_PROMPT)
    }

    /// Body to send to the endpoint
    #[must_use]
    pub fn body(&self) -> Value {
        if let Some(body) = self.input.get("body") {
            return body.clone();
        }
        let mut body = self.input.clone();
        body.remove("endpoint");
        Value::Object(body)
    }
}

/// Job outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobResponse {
    /// The endpoint answered, successfully or not
    Success {
        /// Job id
        id: String,
        /// Status the endpoint answered with
        status_code: u16,
        /// Endpoint response body
        response: Value,
    },
    /// The endpoint could not be reached in time
    Error {
        /// Job id
        id: String,
        /// What went wrong
        error: String,
    },
}

/// Outcome of forwarding a job
enum Forwarded {
    Answered(Value),
    Failed(ApiError),
    Unencodable(serde_json::Error),
}

async fn forward(state: &AppState, job: &Job) -> Forwarded {
    let endpoint = job.endpoint();
    let encoded = if endpoint == RAW_PROMPT {
        match state.engine.submit(job.body()).await {
            Ok(result) => serde_json::to_value(result),
            Err(e) => return Forwarded::Failed(e.into()),
        }
    } else {
        match handler::dispatch(state, Method::Post, endpoint, job.body()).await {
            Ok(output) => serde_json::to_value(output),
            Err(e) => return Forwarded::Failed(e),
        }
    };
    match encoded {
        Ok(value) => Forwarded::Answered(value),
        Err(e) => Forwarded::Unencodable(e),
    }
}

fn unencodable(span: &tracing::Span, id: String, error: &serde_json::Error) -> JobResponse {
    tracing::error!(parent: span, error = %error, "job response could not be encoded");
    JobResponse::Error {
        id,
        error: format!("response could not be encoded: {error}"),
    }
}

/// Run a job
pub async fn run(State(state): State<AppState>, body: Bytes) -> Json<JobResponse> {
    let request_id = RequestId::new();

    let job: Job = match handler::parse_body(&body).and_then(|v| {
        serde_json::from_value(v).map_err(|e| ApiError::MalformedBody(e.to_string()))
    }) {
        Ok(job) => job,
        Err(e) => {
            return Json(JobResponse::Error {
                id: request_id.to_string(),
                error: e.to_string(),
            });
        }
    };
    let id = job.id.clone().unwrap_or_else(|| request_id.to_string());
    let span = tracing::info_span!("job", request_id = %request_id, job_id = %id, endpoint = job.endpoint());

    let outcome = forward(&state, &job).instrument(span.clone()).await;
    let response = match outcome {
        Forwarded::Answered(response) => JobResponse::Success {
            id,
            status_code: StatusCode::OK.as_u16(),
            response,
        },
        Forwarded::Failed(ApiError::Engine(e)) if e.is_timeout() => {
            tracing::warn!(parent: &span, error = %e, "job timed out");
            JobResponse::Error {
                id,
                error: e.to_string(),
            }
        }
        Forwarded::Failed(e) => {
            tracing::warn!(parent: &span, error = %e, status = e.status().as_u16(), "job failed");
            match serde_json::to_value(e.body()) {
                Ok(response) => JobResponse::Success {
                    id,
                    status_code: e.status().as_u16(),
                    response,
                },
                Err(encode) => unencodable(&span, id, &encode),
            }
        }
        Forwarded::Unencodable(e) => unencodable(&span, id, &e),
    };
    Json(response)
}

//! API server: router built from the endpoint registry.

use crate::config::{ConfigError, ServerConfig};
use crate::engine::ExecutionEngine;
use crate::{handler, job};
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, on, post, MethodFilter};
use axum::Router;
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use unirig_core::Timestamp;
use unirig_schema::{FieldSpec, SchemaValidator};
use unirig_workflow::{EndpointDescriptor, EndpointRegistry, Method};

/// Shared per-process state
#[derive(Clone)]
pub struct AppState {
    /// Endpoint table, fixed after startup
    pub registry: Arc<EndpointRegistry>,
    /// Engine client
    pub engine: Arc<dyn ExecutionEngine>,
    /// Request validator
    pub validator: SchemaValidator,
}

impl AppState {
    /// Create state with the default validator
    #[must_use]
    pub fn new(registry: Arc<EndpointRegistry>, engine: Arc<dyn ExecutionEngine>) -> Self {
        Self {
            registry,
            engine,
            validator: SchemaValidator::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Timestamp::now().to_rfc3339(),
    })
}

/// One field in an endpoint listing
#[derive(Debug, Clone, Serialize)]
pub struct FieldSummary {
    /// Field name
    pub name: &'static str,
    /// JSON type
    #[serde(rename = "type")]
    pub field_type: String,
    /// Whether the field must be sent
    pub required: bool,
    /// Default, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Allowed values, if enumerated
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<Value>,
    /// Description
    pub description: &'static str,
}

impl From<&FieldSpec> for FieldSummary {
    fn from(spec: &FieldSpec) -> Self {
        Self {
            name: spec.name,
            field_type: spec.field_type.to_string(),
            required: spec.required,
            default: spec.default.as_ref().map(|d| d.describe()),
            allowed: spec.allowed.clone(),
            description: spec.description,
        }
    }
}

/// One endpoint in the listing
#[derive(Debug, Clone, Serialize)]
pub struct EndpointSummary {
    /// Method
    pub method: Method,
    /// Path
    pub path: &'static str,
    /// Summary
    pub summary: &'static str,
    /// Request fields
    pub fields: Vec<FieldSummary>,
}

impl From<&EndpointDescriptor> for EndpointSummary {
    fn from(d: &EndpointDescriptor) -> Self {
        Self {
            method: d.method,
            path: d.path,
            summary: d.summary,
            fields: d.schema.fields.iter().map(FieldSummary::from).collect(),
        }
    }
}

async fn endpoints(State(state): State<AppState>) -> Json<Vec<EndpointSummary>> {
    Json(state.registry.iter().map(EndpointSummary::from).collect())
}

fn method_filter(method: Method) -> MethodFilter {
    match method {
        Method::Get => MethodFilter::GET,
        Method::Post => MethodFilter::POST,
    }
}

/// Build the router: fixed routes plus one route per registered endpoint
pub fn router(state: AppState) -> Router {
    let routes: Vec<(Method, &'static str)> = state.registry.iter().map(|d| (d.method, d.path)).collect();

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/endpoints", get(endpoints))
        .route("/run", post(job::run));

    for (method, path) in routes {
        router = router.route(
            path,
            on(
                method_filter(method),
                move |State(state): State<AppState>, body: Bytes| handler::workflow(state, method, path, body),
            ),
        );
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// API server
pub struct ApiServer {
    addr: SocketAddr,
    state: AppState,
}

impl ApiServer {
    /// Create a new server
    ///
    /// # Errors
    ///
    /// Returns error if the bind address is invalid
    pub fn new(config: &ServerConfig, state: AppState) -> Result<Self, ConfigError> {
        Ok(Self {
            addr: config.bind_addr()?,
            state,
        })
    }

    /// Serve until ctrl-c
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot bind or the server fails
    pub async fn serve(self) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!(
            addr = %listener.local_addr()?,
            endpoints = self.state.registry.len(),
            "listening"
        );
        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("shutting down");
                }
            })
            .await
    }
}

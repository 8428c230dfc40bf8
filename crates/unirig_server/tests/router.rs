//! Router tests against an in-process fake engine.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use unirig_graph::NodeGraph;
use unirig_server::{router, AppState, EngineError, ExecutionEngine};
use unirig_workflow::{EndpointRegistry, EngineResult};

/// Answers every prompt by giving each node's first output a path
#[derive(Default)]
struct FakeEngine {
    prompts: Mutex<Vec<Value>>,
    drop_last: bool,
    fail: Option<EngineError>,
}

#[async_trait]
impl ExecutionEngine for FakeEngine {
    async fn submit(&self, prompt: Value) -> Result<EngineResult, EngineError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        if let Some(e) = &self.fail {
            return Err(e.clone());
        }

        let graph: NodeGraph = serde_json::from_value(prompt).map_err(|e| EngineError::Decode(e.to_string()))?;
        let last = graph.max_index();
        let mut result = EngineResult::new(1.5);
        for id in graph.ids() {
            if self.drop_last && id.index() == last {
                continue;
            }
            result = result.with_node(id.clone(), vec![json!(format!("/out/{id}.fbx")), json!("aux")]);
        }
        Ok(result)
    }

    async fn health(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

fn app(engine: FakeEngine) -> (Router, Arc<FakeEngine>) {
    let engine = Arc::new(engine);
    let registry = Arc::new(EndpointRegistry::standard().unwrap());
    let state = AppState::new(registry, engine.clone());
    (router(state), engine)
}

async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(v) => Body::from(serde_json::to_vec(&v).unwrap()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app(FakeEngine::default());
    let (status, body) = call(app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_endpoint_listing() {
    let (app, _) = app(FakeEngine::default());
    let (status, body) = call(app, "GET", "/endpoints", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list[0]["method"], "POST");
    assert_eq!(list[0]["path"], "/workflow/rig-avatar");
    let mesh = list[0]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == "mesh_url")
        .unwrap();
    assert_eq!(mesh["required"], true);
}

#[tokio::test]
async fn test_rig_round_trip() {
    let (app, engine) = app(FakeEngine::default());
    let (status, body) = call(
        app,
        "POST",
        "/workflow/rig-avatar",
        Some(json!({"mesh_url": "a.glb", "skeleton_template": "mixamo"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result_path"], "/out/3.fbx");
    assert_eq!(body["processing_time"], 1.5);

    let prompts = engine.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0]["3"]["operation"], "UniRigAutoRig");
    assert_eq!(prompts[0]["3"]["inputs"]["trimesh"], json!(["1", 0]));
}

#[tokio::test]
async fn test_enveloped_request() {
    let (app, _) = app(FakeEngine::default());
    let (status, body) = call(
        app,
        "POST",
        "/workflow/animate-avatar",
        Some(json!({"id": "j1", "input": {"rigged_fbx_url": "r.fbx", "animation_url": "idle.fbx"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result_path"], "/out/2.fbx");
}

#[tokio::test]
async fn test_validation_failure_lists_every_field() {
    let (app, engine) = app(FakeEngine::default());
    let (status, body) = call(
        app,
        "POST",
        "/workflow/fit-clothing",
        Some(json!({"clothing_category": "hat", "ai_generated": "yes"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    for expected in ["avatar_mesh_url", "clothing_mesh_url", "clothing_category", "ai_generated"] {
        assert!(fields.contains(&expected), "{expected} not reported: {fields:?}");
    }
    assert!(engine.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_terminal_is_bad_gateway() {
    let (app, _) = app(FakeEngine {
        drop_last: true,
        ..FakeEngine::default()
    });
    let (status, body) = call(
        app,
        "POST",
        "/workflow/fit-clothing",
        Some(json!({"avatar_mesh_url": "a.glb", "clothing_mesh_url": "c.glb"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "incomplete_result");
}

#[tokio::test]
async fn test_engine_timeout_is_gateway_timeout() {
    let (app, _) = app(FakeEngine {
        fail: Some(EngineError::Timeout { secs: 300 }),
        ..FakeEngine::default()
    });
    let (status, body) = call(app, "POST", "/workflow/rig-avatar", Some(json!({"mesh_url": "a.glb"}))).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "engine_timeout");
}

#[tokio::test]
async fn test_malformed_body() {
    let (app, _) = app(FakeEngine::default());
    let request = Request::builder()
        .method("POST")
        .uri("/workflow/rig-avatar")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_method_not_routed() {
    let (app, _) = app(FakeEngine::default());
    let (status, _) = call(app, "GET", "/workflow/rig-avatar", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_run_dispatches_to_endpoint() {
    let (app, _) = app(FakeEngine::default());
    let (status, body) = call(
        app,
        "POST",
        "/run",
        Some(json!({
            "id": "job-7",
            "input": {
                "endpoint": "/workflow/fit-clothing",
                "body": {"input": {
                    "avatar_mesh_url": "a.glb",
                    "clothing_mesh_url": "c.glb",
                    "ai_generated": false,
                    "combine_with_avatar": true
                }}
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["id"], "job-7");
    assert_eq!(body["status_code"], 200);
    assert_eq!(body["response"]["result_path"], "/out/8.fbx");
}

#[tokio::test]
async fn test_run_forwards_raw_prompt() {
    let (app, engine) = app(FakeEngine::default());
    let graph = json!({"1": {"operation": "UniRigLoadMesh", "inputs": {"source": "a.glb"}}});
    let (_, body) = call(app, "POST", "/run", Some(json!({"input": {"body": graph.clone()}}))).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["response"]["outputs"]["1"]["outputs"][0], "/out/1.fbx");
    assert_eq!(engine.prompts.lock().unwrap()[0], graph);
}

#[tokio::test]
async fn test_run_reports_inner_status() {
    let (app, _) = app(FakeEngine::default());
    let (_, body) = call(
        app,
        "POST",
        "/run",
        Some(json!({"input": {"endpoint": "/workflow/unknown", "body": {}}})),
    )
    .await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["status_code"], 404);
    assert_eq!(body["response"]["error"], "unknown_endpoint");
}

#[tokio::test]
async fn test_run_timeout_is_error_status() {
    let (app, _) = app(FakeEngine {
        fail: Some(EngineError::Timeout { secs: 300 }),
        ..FakeEngine::default()
    });
    let (_, body) = call(
        app,
        "POST",
        "/run",
        Some(json!({"input": {"endpoint": "/workflow/rig-avatar", "body": {"mesh_url": "a.glb"}}})),
    )
    .await;
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains("300 seconds"));
}

#[tokio::test]
async fn test_run_without_body_member_uses_rest_of_input() {
    let (app, engine) = app(FakeEngine::default());
    let (_, body) = call(
        app,
        "POST",
        "/run",
        Some(json!({"input": {"endpoint": "/workflow/rig-avatar", "mesh_url": "a.glb"}})),
    )
    .await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["status_code"], 200);
    assert_eq!(body["response"]["result_path"], "/out/3.fbx");

    let prompts = engine.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0]["1"]["inputs"]["source"], "a.glb");
}

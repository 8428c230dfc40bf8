//! Execution engine client.
//!
//! The engine takes a node graph and answers with every node's outputs.
//! One request, one response: no polling and no retry here.

use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use http::{Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use thiserror::Error;
use unirig_graph::NodeGraph;
use unirig_workflow::EngineResult;

/// Failure talking to the engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Connection or protocol failure
    #[error("engine unreachable: {0}")]
    Transport(String),

    /// Engine did not answer in time
    #[error("engine did not answer within {secs} seconds")]
    Timeout {
        /// Budget that elapsed
        secs: u64,
    },

    /// Engine answered with a non-success status
    #[error("engine returned {status}: {body}")]
    Status {
        /// HTTP status
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Engine answer was not a result mapping
    #[error("engine response is not a result mapping: {0}")]
    Decode(String),

    /// Graph could not be encoded
    #[error("failed to encode graph: {0}")]
    Encode(String),
}

impl EngineError {
    /// True when the call ran out of time
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Something that executes node graphs
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Submit a prompt in wire form and wait for its result
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout, or an undecodable answer
    async fn submit(&self, prompt: Value) -> Result<EngineResult, EngineError>;

    /// Check the engine is up
    ///
    /// # Errors
    ///
    /// Returns error if the engine is unreachable or unhealthy
    async fn health(&self) -> Result<(), EngineError>;

    /// Execute a compiled graph
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout, or an undecodable answer
    async fn execute(&self, graph: &NodeGraph) -> Result<EngineResult, EngineError> {
        let prompt = serde_json::to_value(graph).map_err(|e| EngineError::Encode(e.to_string()))?;
        self.submit(prompt).await
    }
}

const MAX_ERROR_BODY: usize = 512;
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Cut `text` to at most `max` bytes without splitting a character
fn truncate_at_boundary(mut text: String, max: usize) -> String {
    if text.len() > max {
        let end = (0..=max).rev().find(|&i| text.is_char_boundary(i)).unwrap_or(0);
        text.truncate(end);
    }
    text
}

/// Engine reached over plain HTTP
#[derive(Debug, Clone)]
pub struct HttpEngine {
    base: String,
    timeout: Duration,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpEngine {
    /// Create a client for the engine at `base`
    #[must_use]
    pub fn new(base: &Uri, timeout: Duration) -> Self {
        Self {
            base: base.to_string().trim_end_matches('/').to_string(),
            timeout,
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }

    fn uri(&self, path: &str) -> Result<Uri, EngineError> {
        format!("{}{}", self.base, path)
            .parse()
            .map_err(|e: http::uri::InvalidUri| EngineError::Transport(e.to_string()))
    }

    async fn send(
        &self,
        request: Request<Full<Bytes>>,
        budget: Duration,
    ) -> Result<(StatusCode, Bytes), EngineError> {
        let call = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| EngineError::Transport(e.to_string()))?;
            let status = response.status();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| EngineError::Transport(e.to_string()))?
                .to_bytes();
            Ok::<_, EngineError>((status, body))
        };

        tokio::time::timeout(budget, call)
            .await
            .map_err(|_| EngineError::Timeout {
                secs: budget.as_secs(),
            })?
    }
}

#[async_trait]
impl ExecutionEngine for HttpEngine {
    async fn submit(&self, prompt: Value) -> Result<EngineResult, EngineError> {
        let body = serde_json::to_vec(&json!({ "prompt": prompt }))
            .map_err(|e| EngineError::Encode(e.to_string()))?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.uri("/prompt")?)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let started = Instant::now();
        let (status, body) = self.send(request, self.timeout).await?;
        if !status.is_success() {
            return Err(EngineError::Status {
                status: status.as_u16(),
                body: truncate_at_boundary(String::from_utf8_lossy(&body).into_owned(), MAX_ERROR_BODY),
            });
        }

        let result: EngineResult =
            serde_json::from_slice(&body).map_err(|e| EngineError::Decode(e.to_string()))?;
        tracing::debug!(
            nodes = result.outputs.len(),
            engine_secs = result.execution_time,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "engine returned"
        );
        Ok(result)
    }

    async fn health(&self) -> Result<(), EngineError> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(self.uri("/health")?)
            .body(Full::new(Bytes::new()))
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let (status, _) = self.send(request, self.timeout.min(HEALTH_TIMEOUT)).await?;
        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(EngineError::Status {
                status: status.as_u16(),
                body: String::new(),
            })
        }
    }
}

/// Poll the engine's health check until it passes or `budget` runs out
///
/// # Errors
///
/// Returns the last failure once the budget is spent
pub async fn wait_for_engine(
    engine: &dyn ExecutionEngine,
    budget: Duration,
    interval: Duration,
) -> Result<(), EngineError> {
    let deadline = Instant::now() + budget;
    loop {
        match engine.health().await {
            Ok(()) => return Ok(()),
            Err(e) if Instant::now() + interval >= deadline => {
                tracing::warn!(error = %e, "engine not ready, giving up");
                return Err(e);
            }
            Err(e) => {
                tracing::debug!(error = %e, "engine not ready yet");
                tokio::time::sleep(interval).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ExecutionEngine for Flaky {
        async fn submit(&self, _prompt: Value) -> Result<EngineResult, EngineError> {
            Ok(EngineResult::new(0.0))
        }

        async fn health(&self) -> Result<(), EngineError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                Err(EngineError::Transport("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_wait_until_healthy() {
        let engine = Flaky {
            failures: 2,
            calls: AtomicUsize::new(0),
        };
        wait_for_engine(&engine, Duration::from_secs(5), Duration::from_millis(1))
            .await
            .unwrap();
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_wait_gives_up() {
        let engine = Flaky {
            failures: usize::MAX,
            calls: AtomicUsize::new(0),
        };
        let err = wait_for_engine(&engine, Duration::from_millis(20), Duration::from_millis(5))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Transport(_)));
    }

    /// Serve one canned HTTP response on a local port
    async fn canned(status: &'static str, body: String) -> Uri {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64 * 1024];
            let _ = socket.read(&mut buf).await;
            let reply = format!(
                "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}").parse().unwrap()
    }

    #[test]
    fn test_truncate_keeps_char_boundary() {
        let text = format!("{}é and more", "x".repeat(511));
        let cut = truncate_at_boundary(text, MAX_ERROR_BODY);
        assert_eq!(cut.len(), 511);
        assert!(cut.chars().all(|c| c == 'x'));

        assert_eq!(truncate_at_boundary("short".to_string(), MAX_ERROR_BODY), "short");
    }

    #[tokio::test]
    async fn test_error_body_with_multibyte_text() {
        let base = canned("500 Internal Server Error", format!("{}é and more", "x".repeat(511))).await;
        let engine = HttpEngine::new(&base, Duration::from_secs(5));
        let err = engine.submit(json!({})).await.unwrap_err();
        match err {
            EngineError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), 511);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_result_without_timing_is_decode_error() {
        let base = canned("200 OK", r#"{"outputs": {"1": {"outputs": ["/out/a.fbx"]}}}"#.to_string()).await;
        let engine = HttpEngine::new(&base, Duration::from_secs(5));
        let err = engine.submit(json!({})).await.unwrap_err();
        assert!(matches!(err, EngineError::Decode(_)));
    }

    #[tokio::test]
    async fn test_health_uses_short_budget() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base: Uri = format!("http://{}", listener.local_addr().unwrap()).parse().unwrap();
        // Accept and never answer
        tokio::spawn(async move {
            let _held = listener.accept().await;
            std::future::pending::<()>().await;
        });

        let engine = HttpEngine::new(&base, Duration::from_secs(300));
        let started = Instant::now();
        let err = engine.health().await.unwrap_err();
        assert_eq!(err, EngineError::Timeout { secs: HEALTH_TIMEOUT.as_secs() });
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[test]
    fn test_uri_join() {
        let base: Uri = "http://127.0.0.1:8188".parse().unwrap();
        let engine = HttpEngine::new(&base, Duration::from_secs(1));
        assert_eq!(engine.uri("/prompt").unwrap(), "http://127.0.0.1:8188/prompt");
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_transport_error() {
        // Port 9 (discard) is closed on test hosts
        let base: Uri = "http://127.0.0.1:9".parse().unwrap();
        let engine = HttpEngine::new(&base, Duration::from_secs(5));
        let err = engine.health().await.unwrap_err();
        assert!(matches!(err, EngineError::Transport(_) | EngineError::Timeout { .. }));
    }
}

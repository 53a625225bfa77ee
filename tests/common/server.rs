//! Fake school backend lifecycle management
//!
//! Each test gets an isolated axum server on a random port. Routes answer
//! with whatever JSON the test configured, and can be switched to fail or
//! to hang so degraded behavior can be exercised over real HTTP.

use super::constants::*;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Clone)]
enum RouteBehavior {
    Json(Value),
    Status(StatusCode),
    Hang,
}

#[derive(Default)]
struct BackendState {
    routes: HashMap<String, RouteBehavior>,
    hits: HashMap<String, usize>,
}

type SharedState = Arc<Mutex<BackendState>>;

/// Fake backend instance
///
/// When dropped, the server gracefully shuts down.
pub struct TestBackend {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    state: SharedState,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestBackend {
    /// Spawns a backend where every category route answers with an empty list.
    pub async fn spawn() -> Self {
        let state: SharedState = Arc::default();
        {
            let mut guard = state.lock().unwrap();
            for path in [
                MESSAGES_PATH,
                PARTIAL_GRADES_PATH,
                REPORT_CARDS_PATH,
                EXTERNAL_RESULTS_PATH,
            ] {
                guard
                    .routes
                    .insert(path.to_string(), RouteBehavior::Json(Value::Array(vec![])));
            }
        }

        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .fallback(serve_route)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let backend = Self {
            base_url,
            state,
            _shutdown_tx: Some(shutdown_tx),
        };
        backend.wait_for_ready().await;
        backend
    }

    /// Makes `path` answer 200 with `body`.
    pub fn set_json(&self, path: &str, body: Value) {
        self.set(path, RouteBehavior::Json(body));
    }

    /// Makes `path` answer with an error status and no body.
    pub fn fail(&self, path: &str, status: StatusCode) {
        self.set(path, RouteBehavior::Status(status));
    }

    /// Makes `path` never answer.
    pub fn hang(&self, path: &str) {
        self.set(path, RouteBehavior::Hang);
    }

    /// Number of requests received on `path`, authenticated or not.
    pub fn hits(&self, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .hits
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    fn set(&self, path: &str, behavior: RouteBehavior) {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert(path.to_string(), behavior);
    }

    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Backend did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/health", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

async fn serve_route(State(state): State<SharedState>, headers: HeaderMap, uri: Uri) -> Response {
    let path = uri.path().to_string();
    let behavior = {
        let mut guard = state.lock().unwrap();
        *guard.hits.entry(path.clone()).or_default() += 1;
        guard.routes.get(&path).cloned()
    };

    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TEST_TOKEN));
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match behavior {
        Some(RouteBehavior::Json(body)) => Json(body).into_response(),
        Some(RouteBehavior::Status(status)) => status.into_response(),
        Some(RouteBehavior::Hang) => {
            std::future::pending::<()>().await;
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

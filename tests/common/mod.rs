//! In-process stand-in for the external chat service.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

use chatrelay::{ContainerConfig, HttpClientConfig, RetryPolicy};

/// One scripted answer of the stub.
#[derive(Clone)]
pub struct StubReply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl StubReply {
    pub fn ok(response: &str) -> Self {
        Self::status(
            200,
            &serde_json::json!({ "response": response, "usage": "5" }).to_string(),
        )
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
pub struct StubState {
    replies: Mutex<VecDeque<StubReply>>,
    calls: AtomicUsize,
    bodies: Mutex<Vec<serde_json::Value>>,
    healthy: bool,
}

impl StubState {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<serde_json::Value> {
        self.bodies.lock().unwrap().clone()
    }
}

pub struct StubUpstream {
    pub base_url: String,
    pub state: Arc<StubState>,
}

impl StubUpstream {
    /// Serves `replies` in order; once exhausted every call gets `ok("hi")`.
    pub async fn start(replies: Vec<StubReply>) -> Self {
        Self::start_with_health(replies, true).await
    }

    pub async fn start_with_health(replies: Vec<StubReply>, healthy: bool) -> Self {
        let state = Arc::new(StubState {
            replies: Mutex::new(replies.into()),
            healthy,
            ..StubState::default()
        });

        let app = Router::new()
            .route("/api/v1/chat/simple", post(chat_simple))
            .route("/health", get(health))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn calls(&self) -> usize {
        self.state.calls()
    }
}

async fn chat_simple(
    State(state): State<Arc<StubState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    state.bodies.lock().unwrap().push(body);

    let reply = state
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| StubReply::ok("hi"));

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    let status = StatusCode::from_u16(reply.status).unwrap();
    (status, [(header::CONTENT_TYPE, "application/json")], reply.body).into_response()
}

async fn health(State(state): State<Arc<StubState>>) -> StatusCode {
    if state.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Address nothing listens on.
pub async fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Container config pointed at `base_url` with millisecond backoff.
pub fn fast_config(base_url: &str, max_attempts: u32) -> ContainerConfig {
    ContainerConfig {
        base_url: base_url.to_string(),
        http: HttpClientConfig {
            connect_timeout_ms: 1_000,
            read_timeout_ms: 2_000,
            write_timeout_ms: 2_000,
            ..HttpClientConfig::default()
        },
        retry: RetryPolicy {
            max_attempts,
            initial_backoff_ms: 5,
            max_backoff_ms: 20,
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        },
    }
}

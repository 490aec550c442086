//! HTTP surface of the relay.
//!
//! `POST /api/v1/ai/greeting` runs one chat request through the pipeline and
//! answers with the envelope; `GET /health` reports the relay and its upstream.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    routing::{get, post},
    Json,
};
use mockable::Clock;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::application::SendChatUseCase;

use super::container::Container;
use super::envelope::{to_envelope, ApiResponse, ChatResponse};

/// Inbound chat request. Missing or `null` fields decode as empty and are
/// rejected by validation rather than by the decoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_tokens: i64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub upstream: bool,
}

#[derive(Clone)]
pub struct AppState {
    use_case: Arc<SendChatUseCase>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl AppState {
    pub fn from_container(container: &Container) -> Self {
        Self {
            use_case: container.send_chat_use_case(),
            clock: container.clock(),
        }
    }
}

pub fn create_router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/api/v1/ai/greeting", post(greeting))
        .route("/health", get(health))
        .with_state(state)
}

/// Binds `addr` and serves until the listener fails.
pub async fn serve(container: &Container, addr: SocketAddr) -> Result<()> {
    let router = create_router(AppState::from_container(container));
    let listener = TcpListener::bind(addr).await?;
    info!(
        "HTTP server listening on {} (upstream {})",
        listener.local_addr()?,
        container.base_url()
    );

    axum::serve(listener, router).await?;
    Ok(())
}

async fn greeting(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResponse<ChatResponse> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return ApiResponse::invalid_request(&rejection.body_text(), state.clock.as_ref())
        }
    };

    info!(
        message_length = request.message.chars().count(),
        max_tokens = request.max_tokens,
        "Chat request received"
    );

    let outcome = state
        .use_case
        .execute(&request.message, request.max_tokens)
        .await;
    to_envelope(outcome, state.clock.as_ref())
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let upstream = state.use_case.health().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        upstream,
    })
}

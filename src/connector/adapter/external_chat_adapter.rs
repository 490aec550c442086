use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::{AdapterError, ChatReply, ExternalChatPort};
use crate::domain::RequestId;

use super::{retry_with_backoff, HttpTransport, RetryPolicy, TransportError, TransportResponse};

/// Default target: the chat service running locally on its standard port.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const BASE_URL_ENV: &str = "EXTERNAL_CHAT_BASE_URL";
const CHAT_PATH: &str = "/api/v1/chat/simple";
const HEALTH_PATH: &str = "/health";
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
/// Upstream bodies quoted in logs are cut to this many characters.
const LOGGED_BODY_LIMIT: usize = 512;

/// Wire payload. The request id stays on this side of the boundary.
#[derive(Serialize)]
struct ExternalChatRequest<'a> {
    message: &'a str,
    max_tokens: u32,
}

/// [`ExternalChatPort`] speaking the chat service's simple-chat HTTP API.
///
/// Each attempt is one `POST {base_url}/api/v1/chat/simple`. Transport
/// failures and 5xx replies are retried according to the [`RetryPolicy`];
/// 4xx replies and unusable bodies are returned on the first attempt.
pub struct ExternalChatAdapter {
    transport: Arc<dyn HttpTransport>,
    retry_policy: RetryPolicy,
    /// Full endpoint URL (base + CHAT_PATH).
    chat_url: String,
    health_url: String,
}

impl ExternalChatAdapter {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: impl Into<String>,
        retry_policy: RetryPolicy,
    ) -> Self {
        let base: String = base_url.into();
        let trimmed = base.trim_end_matches('/');
        Self {
            transport,
            retry_policy,
            chat_url: format!("{trimmed}{CHAT_PATH}"),
            health_url: format!("{trimmed}{HEALTH_PATH}"),
        }
    }

    /// Base URL from `EXTERNAL_CHAT_BASE_URL`, falling back to
    /// [`DEFAULT_BASE_URL`].
    pub fn configured_base_url() -> String {
        std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
    }

    async fn attempt(
        &self,
        request_id: &RequestId,
        payload: &serde_json::Value,
        attempt: u32,
    ) -> Result<ChatReply, AdapterError> {
        debug!(%request_id, attempt, url = %self.chat_url, "Sending chat request upstream");

        let response = self
            .transport
            .post_json(&self.chat_url, payload)
            .await
            .map_err(|e| match e {
                TransportError::Timeout(msg) => AdapterError::timeout(msg),
                TransportError::Connect(msg) | TransportError::Other(msg) => {
                    AdapterError::unavailable(msg)
                }
            })?;

        classify_response(response)
    }
}

/// Maps a received HTTP exchange onto a reply or an adapter error.
fn classify_response(response: TransportResponse) -> Result<ChatReply, AdapterError> {
    if response.is_server_error() {
        return Err(AdapterError::ExternalServerError {
            status: response.status,
            body: response.body,
        });
    }
    if !response.is_success() {
        return Err(AdapterError::ExternalClientError {
            status: response.status,
            body: response.body,
        });
    }
    if response.body.trim().is_empty() {
        return Err(AdapterError::empty_response("reply body was empty"));
    }

    serde_json::from_str::<ChatReply>(&response.body)
        .map_err(|e| AdapterError::empty_response(format!("malformed reply body: {e}")))
}

fn truncated(body: &str) -> String {
    body.chars().take(LOGGED_BODY_LIMIT).collect()
}

#[async_trait]
impl ExternalChatPort for ExternalChatAdapter {
    async fn send(
        &self,
        request_id: &RequestId,
        message: &str,
        max_tokens: u32,
    ) -> Result<ChatReply, AdapterError> {
        let payload = serde_json::to_value(ExternalChatRequest {
            message,
            max_tokens,
        })
        .map_err(|e| AdapterError::unavailable(format!("failed to encode request: {e}")))?;

        let result = retry_with_backoff(
            &self.retry_policy,
            |attempt| self.attempt(request_id, &payload, attempt),
            |err: &AdapterError| {
                let retry = err.is_retryable();
                if retry {
                    warn!(%request_id, "Retryable upstream failure: {}", err);
                }
                retry
            },
        )
        .await;

        match &result {
            Ok(_) => info!(%request_id, "External chat reply received"),
            Err(AdapterError::ExternalClientError { status, body })
            | Err(AdapterError::ExternalServerError { status, body }) => {
                warn!(%request_id, status, body = %truncated(body), "External chat call failed");
            }
            Err(err) => warn!(%request_id, "External chat call failed: {}", err),
        }

        result
    }

    async fn health_check(&self) -> bool {
        let probe = self.transport.get(&self.health_url, HEALTH_TIMEOUT);
        match tokio::time::timeout(HEALTH_TIMEOUT, probe).await {
            Ok(Ok(response)) => response.is_success(),
            Ok(Err(e)) => {
                debug!("Health probe failed: {}", e);
                false
            }
            Err(_) => {
                debug!("Health probe timed out after {:?}", HEALTH_TIMEOUT);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Transport replaying prepared exchanges and recording what it was sent.
    struct ReplayTransport {
        replies: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
        sent: Mutex<Vec<(String, serde_json::Value)>>,
    }

    impl ReplayTransport {
        fn new(replies: Vec<Result<TransportResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<(String, serde_json::Value)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ReplayTransport {
        async fn post_json(
            &self,
            url: &str,
            body: &serde_json::Value,
        ) -> Result<TransportResponse, TransportError> {
            self.sent.lock().unwrap().push((url.to_string(), body.clone()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("no reply scripted".into())))
        }

        async fn get(&self, url: &str, _timeout: Duration) -> Result<TransportResponse, TransportError> {
            self.sent.lock().unwrap().push((url.to_string(), serde_json::Value::Null));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("no reply scripted".into())))
        }
    }

    fn status(code: u16, body: &str) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse {
            status: code,
            body: body.to_string(),
        })
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        }
    }

    fn adapter(transport: Arc<ReplayTransport>, attempts: u32) -> ExternalChatAdapter {
        ExternalChatAdapter::new(transport, "http://chat.local/", fast_retry(attempts))
    }

    #[tokio::test]
    async fn test_payload_carries_only_message_and_tokens() {
        let transport = ReplayTransport::new(vec![status(200, r#"{"response":"hi","usage":"5"}"#)]);

        let reply = adapter(transport.clone(), 3)
            .send(&RequestId::generate(), "hello", 100)
            .await
            .unwrap();

        assert_eq!(reply.response.as_deref(), Some("hi"));
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "http://chat.local/api/v1/chat/simple");
        assert_eq!(sent[0].1, serde_json::json!({"message": "hello", "max_tokens": 100}));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let transport = ReplayTransport::new(vec![
            status(503, "busy"),
            status(503, "busy"),
            status(200, r#"{"response":"hi"}"#),
        ]);

        let reply = adapter(transport.clone(), 3)
            .send(&RequestId::generate(), "hello", 100)
            .await
            .unwrap();

        assert!(reply.is_success());
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_last_error() {
        let transport = ReplayTransport::new(vec![
            status(500, "a"),
            status(502, "b"),
            status(503, "c"),
        ]);

        let err = adapter(transport.clone(), 3)
            .send(&RequestId::generate(), "hello", 100)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AdapterError::ExternalServerError {
                status: 503,
                body: "c".to_string()
            }
        );
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let transport = ReplayTransport::new(vec![status(400, "bad"), status(200, "{}")]);

        let err = adapter(transport.clone(), 3)
            .send(&RequestId::generate(), "hello", 100)
            .await
            .unwrap_err();

        assert!(matches!(err, AdapterError::ExternalClientError { status: 400, .. }));
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failures_are_classified_and_retried() {
        let transport = ReplayTransport::new(vec![
            Err(TransportError::Connect("refused".into())),
            Err(TransportError::Timeout("read".into())),
        ]);

        let err = adapter(transport.clone(), 2)
            .send(&RequestId::generate(), "hello", 100)
            .await
            .unwrap_err();

        assert_eq!(err, AdapterError::timeout("read"));
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_unusable_bodies_are_empty_responses() {
        for body in ["", "   ", "not json", "[1,2]"] {
            let transport = ReplayTransport::new(vec![status(200, body)]);

            let err = adapter(transport.clone(), 3)
                .send(&RequestId::generate(), "hello", 100)
                .await
                .unwrap_err();

            assert!(matches!(err, AdapterError::EmptyResponse(_)), "body {body:?}");
            assert_eq!(transport.sent().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_redirect_status_is_not_retried() {
        let transport = ReplayTransport::new(vec![status(304, "")]);

        let err = adapter(transport.clone(), 3)
            .send(&RequestId::generate(), "hello", 100)
            .await
            .unwrap_err();

        assert!(matches!(err, AdapterError::ExternalClientError { status: 304, .. }));
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_health_check_swallows_errors() {
        let healthy = ReplayTransport::new(vec![status(200, "ok")]);
        let unhealthy = ReplayTransport::new(vec![status(503, "down")]);
        let unreachable = ReplayTransport::new(vec![Err(TransportError::Connect("refused".into()))]);

        assert!(adapter(healthy.clone(), 1).health_check().await);
        assert_eq!(healthy.sent()[0].0, "http://chat.local/health");
        assert!(!adapter(unhealthy, 1).health_check().await);
        assert!(!adapter(unreachable, 1).health_check().await);
    }
}

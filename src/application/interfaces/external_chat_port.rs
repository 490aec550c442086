use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::RequestId;

/// Raw reply of the external chat service.
///
/// `usage` is documented as a string, but upstream servers have been seen
/// sending a bare number or an object with token counters, so it is kept as
/// raw JSON and interpreted by [`ChatReply::tokens_used`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub usage: Option<serde_json::Value>,
}

impl ChatReply {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: serde_json::Value) -> Self {
        self.usage = Some(usage);
        self
    }

    /// A reply counts as successful only when it carries non-blank text.
    pub fn is_success(&self) -> bool {
        self.response.as_deref().is_some_and(|r| !r.trim().is_empty())
    }

    pub fn tokens_used(&self) -> Option<u32> {
        let count = match self.usage.as_ref()? {
            serde_json::Value::String(s) => s.trim().parse::<u64>().ok()?,
            serde_json::Value::Number(n) => n.as_u64()?,
            serde_json::Value::Object(map) => map.get("total_tokens")?.as_u64()?,
            _ => return None,
        };
        u32::try_from(count).ok()
    }
}

/// Classified failure of a call to the external chat service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("external service unavailable: {0}")]
    Unavailable(String),

    #[error("external service timed out: {0}")]
    Timeout(String),

    #[error("external service rejected the request with status {status}")]
    ExternalClientError { status: u16, body: String },

    #[error("external service failed with status {status}")]
    ExternalServerError { status: u16, body: String },

    #[error("empty response from external service: {0}")]
    EmptyResponse(String),
}

impl AdapterError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn empty_response(msg: impl Into<String>) -> Self {
        Self::EmptyResponse(msg.into())
    }

    /// Transport failures and upstream 5xx may succeed on a later attempt;
    /// rejected requests and unusable bodies will not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Timeout(_) | Self::ExternalServerError { .. }
        )
    }
}

/// Outbound boundary to the external chat-completion service.
#[async_trait]
pub trait ExternalChatPort: Send + Sync {
    /// Send one chat request. `request_id` is used for correlation only and
    /// never leaves the process.
    async fn send(
        &self,
        request_id: &RequestId,
        message: &str,
        max_tokens: u32,
    ) -> Result<ChatReply, AdapterError>;

    /// Probe the external service. Never fails; any error reads as `false`.
    async fn health_check(&self) -> bool;
}

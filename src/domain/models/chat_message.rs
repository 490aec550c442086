use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ChatStatus;
use crate::domain::{validate, IllegalTransition, ValidationError};

/// Opaque identifier of one chat request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(format!("chat_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One chat request and its lifecycle.
///
/// Values are never mutated: each transition returns a new `ChatMessage`, so a
/// holder of an older snapshot keeps seeing the state it was handed. Equality
/// and hashing consider the request id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    request_id: RequestId,
    message: String,
    max_tokens: u32,
    response: Option<String>,
    tokens_used: Option<u32>,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    status: ChatStatus,
}

impl ChatMessage {
    /// Validates the input and creates a PENDING request.
    pub fn new(message: &str, max_tokens: i64, clock: &dyn Clock) -> Result<Self, ValidationError> {
        validate(message, max_tokens)?;
        let max_tokens = u32::try_from(max_tokens)
            .map_err(|_| ValidationError::InvalidTokenCount { value: max_tokens })?;

        Ok(Self {
            request_id: RequestId::generate(),
            message: message.to_string(),
            max_tokens,
            response: None,
            tokens_used: None,
            created_at: clock.utc(),
            processed_at: None,
            status: ChatStatus::Pending,
        })
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    pub fn tokens_used(&self) -> Option<u32> {
        self.tokens_used
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    pub fn mark_processing(&self) -> Result<Self, IllegalTransition> {
        self.transition(ChatStatus::Processing)
    }

    /// Records the external reply and finishes the request.
    pub fn complete(
        &self,
        response: impl Into<String>,
        tokens_used: Option<u32>,
        clock: &dyn Clock,
    ) -> Result<Self, IllegalTransition> {
        let mut next = self.transition(ChatStatus::Completed)?;
        next.response = Some(response.into());
        next.tokens_used = tokens_used;
        next.processed_at = Some(clock.utc());
        Ok(next)
    }

    /// Finishes the request with `reason` stored in place of a response.
    pub fn fail(&self, reason: impl Into<String>, clock: &dyn Clock) -> Result<Self, IllegalTransition> {
        let mut next = self.transition(ChatStatus::Failed)?;
        next.response = Some(reason.into());
        next.tokens_used = None;
        next.processed_at = Some(clock.utc());
        Ok(next)
    }

    fn transition(&self, to: ChatStatus) -> Result<Self, IllegalTransition> {
        if !self.status.can_transition_to(to) {
            return Err(IllegalTransition {
                from: self.status,
                to,
            });
        }

        Ok(Self {
            status: to,
            ..self.clone()
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == ChatStatus::Pending
    }

    pub fn is_processing(&self) -> bool {
        self.status == ChatStatus::Processing
    }

    pub fn is_completed(&self) -> bool {
        self.status == ChatStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status == ChatStatus::Failed
    }

    pub fn has_response(&self) -> bool {
        self.response.as_deref().is_some_and(|r| !r.trim().is_empty())
    }

    /// Share of the token budget the reply consumed, in percent.
    pub fn token_efficiency(&self) -> f64 {
        match self.tokens_used {
            Some(used) if self.max_tokens > 0 => f64::from(used) / f64::from(self.max_tokens) * 100.0,
            _ => 0.0,
        }
    }

    /// Time between creation and the terminal transition.
    pub fn processing_time(&self) -> Option<Duration> {
        self.processed_at
            .and_then(|done| (done - self.created_at).to_std().ok())
    }

    pub fn summary(&self) -> String {
        format!(
            "ChatMessage[id={}, status={}, tokens={}/{}]",
            self.request_id,
            self.status,
            self.tokens_used.map_or_else(|| "-".to_string(), |t| t.to_string()),
            self.max_tokens
        )
    }
}

impl PartialEq for ChatMessage {
    fn eq(&self, other: &Self) -> bool {
        self.request_id == other.request_id
    }
}

impl Eq for ChatMessage {}

impl Hash for ChatMessage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.request_id.hash(state);
    }
}

use std::sync::Arc;
use std::time::Instant;

use mockable::Clock;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::application::use_cases::response_mapper::{to_completed, to_failed};
use crate::application::{AdapterError, ExternalChatPort};
use crate::domain::{ChatMessage, IllegalTransition, ValidationError};

/// Typed outcome of a failed chat request.
///
/// Every upstream variant carries the FAILED entity the request ended in.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("validation failed: {0}")]
    ValidationFailed(ValidationError),

    #[error("external service unavailable: {reason}")]
    Unavailable { reason: String, failed: Box<ChatMessage> },

    #[error("external service timed out: {reason}")]
    Timeout { reason: String, failed: Box<ChatMessage> },

    #[error("external service rejected the request with status {status}")]
    ExternalClientError { status: u16, failed: Box<ChatMessage> },

    #[error("external service failed with status {status}")]
    ExternalServerError { status: u16, failed: Box<ChatMessage> },

    #[error("empty response from external service")]
    EmptyResponse { failed: Box<ChatMessage> },

    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),
}

impl OrchestrationError {
    fn from_adapter(err: AdapterError, failed: ChatMessage) -> Self {
        let failed = Box::new(failed);
        match err {
            AdapterError::Unavailable(reason) => Self::Unavailable { reason, failed },
            AdapterError::Timeout(reason) => Self::Timeout { reason, failed },
            AdapterError::ExternalClientError { status, .. } => {
                Self::ExternalClientError { status, failed }
            }
            AdapterError::ExternalServerError { status, .. } => {
                Self::ExternalServerError { status, failed }
            }
            AdapterError::EmptyResponse(_) => Self::EmptyResponse { failed },
        }
    }

    /// The FAILED entity, when the request got far enough to have one.
    pub fn failed_message(&self) -> Option<&ChatMessage> {
        match self {
            Self::Unavailable { failed, .. }
            | Self::Timeout { failed, .. }
            | Self::ExternalClientError { failed, .. }
            | Self::ExternalServerError { failed, .. }
            | Self::EmptyResponse { failed } => Some(failed),
            Self::ValidationFailed(_) | Self::IllegalTransition(_) => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationFailed(_))
    }
}

/// Validates a chat request, relays it to the external service, and maps the
/// reply onto the request lifecycle.
///
/// Retries are the port's business; this use case calls `send` exactly once.
pub struct SendChatUseCase {
    chat_port: Arc<dyn ExternalChatPort>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl SendChatUseCase {
    pub fn new(chat_port: Arc<dyn ExternalChatPort>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { chat_port, clock }
    }

    pub async fn execute(
        &self,
        message: &str,
        max_tokens: i64,
    ) -> Result<ChatMessage, OrchestrationError> {
        let clock: &(dyn Clock + Send + Sync) = self.clock.as_ref();

        let pending = ChatMessage::new(message, max_tokens, clock).map_err(|e| {
            debug!("Rejected chat request: {}", e);
            OrchestrationError::ValidationFailed(e)
        })?;

        info!(
            request_id = %pending.request_id(),
            message_length = pending.message().chars().count(),
            max_tokens = pending.max_tokens(),
            "Processing chat request"
        );

        let start_time = Instant::now();
        let processing = pending.mark_processing().map_err(log_defect)?;

        let outcome = self
            .chat_port
            .send(
                processing.request_id(),
                processing.message(),
                processing.max_tokens(),
            )
            .await;

        match outcome {
            Ok(reply) => {
                let finished = to_completed(&processing, &reply, clock).map_err(log_defect)?;
                if finished.is_failed() {
                    warn!(request_id = %finished.request_id(), "External service returned no text");
                    return Err(OrchestrationError::EmptyResponse {
                        failed: Box::new(finished),
                    });
                }

                info!(
                    "Chat request completed: {} in {:.2}s",
                    finished.summary(),
                    start_time.elapsed().as_secs_f64()
                );
                Ok(finished)
            }
            Err(err) => {
                let failed =
                    to_failed(&processing, &err.to_string(), clock).map_err(log_defect)?;
                warn!(
                    request_id = %failed.request_id(),
                    "Chat request failed after {:.2}s: {}",
                    start_time.elapsed().as_secs_f64(),
                    err
                );
                Err(OrchestrationError::from_adapter(err, failed))
            }
        }
    }

    /// Reachability of the external chat service.
    pub async fn health(&self) -> bool {
        self.chat_port.health_check().await
    }
}

fn log_defect(err: IllegalTransition) -> OrchestrationError {
    error!("Chat lifecycle defect: {}", err);
    OrchestrationError::IllegalTransition(err)
}

use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::application::OrchestrationError;
use crate::domain::{ChatMessage, ValidationError};

const SUCCESS_MESSAGE: &str = "Chat message processed successfully";
const VALIDATION_MESSAGE: &str = "Input validation failed";

static TRACE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Stable machine-readable failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    EmptyMessage,
    MessageTooLong,
    InvalidTokenCount,
    TokenLimitExceeded,
    InvalidRequest,
    ExternalApiUnavailable,
    ExternalApiTimeout,
    ExternalApiClientError,
    ExternalApiError,
    ExternalEmptyResponse,
    InternalServerError,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::EmptyMessage
            | Self::MessageTooLong
            | Self::InvalidTokenCount
            | Self::TokenLimitExceeded
            | Self::InvalidRequest => 400,
            Self::ExternalApiUnavailable
            | Self::ExternalApiClientError
            | Self::ExternalApiError
            | Self::ExternalEmptyResponse => 502,
            Self::ExternalApiTimeout => 504,
            Self::InternalServerError => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "EMPTY_MESSAGE",
            Self::MessageTooLong => "MESSAGE_TOO_LONG",
            Self::InvalidTokenCount => "INVALID_TOKEN_COUNT",
            Self::TokenLimitExceeded => "TOKEN_LIMIT_EXCEEDED",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::ExternalApiUnavailable => "EXTERNAL_API_UNAVAILABLE",
            Self::ExternalApiTimeout => "EXTERNAL_API_TIMEOUT",
            Self::ExternalApiClientError => "EXTERNAL_API_CLIENT_ERROR",
            Self::ExternalApiError => "EXTERNAL_API_ERROR",
            Self::ExternalEmptyResponse => "EXTERNAL_EMPTY_RESPONSE",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Caller-facing description.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "Message must not be empty",
            Self::MessageTooLong => "Message is too long",
            Self::InvalidTokenCount => "Token count is invalid",
            Self::TokenLimitExceeded => "Token count exceeds the limit",
            Self::InvalidRequest => "Invalid request",
            Self::ExternalApiUnavailable => "External chat service is unavailable",
            Self::ExternalApiTimeout => "External chat service timed out",
            Self::ExternalApiClientError => "External chat service rejected the request",
            Self::ExternalApiError => "External chat service failed",
            Self::ExternalEmptyResponse => "External chat service returned an empty response",
            Self::InternalServerError => "Internal server error",
        }
    }
}

impl From<&ValidationError> for ErrorCode {
    fn from(err: &ValidationError) -> Self {
        match err {
            ValidationError::EmptyMessage => Self::EmptyMessage,
            ValidationError::MessageTooLong { .. } => Self::MessageTooLong,
            ValidationError::InvalidTokenCount { .. } => Self::InvalidTokenCount,
            ValidationError::TokenLimitExceeded { .. } => Self::TokenLimitExceeded,
        }
    }
}

impl From<&OrchestrationError> for ErrorCode {
    fn from(err: &OrchestrationError) -> Self {
        match err {
            OrchestrationError::ValidationFailed(e) => e.into(),
            OrchestrationError::Unavailable { .. } => Self::ExternalApiUnavailable,
            OrchestrationError::Timeout { .. } => Self::ExternalApiTimeout,
            OrchestrationError::ExternalClientError { .. } => Self::ExternalApiClientError,
            OrchestrationError::ExternalServerError { .. } => Self::ExternalApiError,
            OrchestrationError::EmptyResponse { .. } => Self::ExternalEmptyResponse,
            OrchestrationError::IllegalTransition(_) => Self::InternalServerError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_value: Option<serde_json::Value>,
    pub message: String,
}

impl From<&ValidationError> for FieldError {
    fn from(err: &ValidationError) -> Self {
        // Message text is not echoed back.
        let rejected_value = match err {
            ValidationError::EmptyMessage | ValidationError::MessageTooLong { .. } => None,
            ValidationError::InvalidTokenCount { value }
            | ValidationError::TokenLimitExceeded { value, .. } => Some(serde_json::json!(value)),
        };
        Self {
            field: err.field().to_string(),
            rejected_value,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub error_code: ErrorCode,
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<Vec<FieldError>>,
    pub timestamp: String,
}

/// Payload of a successful chat call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<&ChatMessage> for ChatResponse {
    fn from(message: &ChatMessage) -> Self {
        Self {
            response: message.response().unwrap_or_default().to_string(),
            processed_at: message.processed_at(),
        }
    }
}

/// Uniform success/failure wrapper returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub timestamp: String,
    pub trace_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: &str, clock: &dyn Clock) -> Self {
        let now = clock.utc();
        Self {
            success: true,
            code: 200,
            message: message.to_string(),
            data: Some(data),
            error: None,
            timestamp: iso_timestamp(now),
            trace_id: next_trace_id(now),
        }
    }

    pub fn failure(
        code: ErrorCode,
        error_message: impl Into<String>,
        field_errors: Option<Vec<FieldError>>,
        clock: &dyn Clock,
    ) -> Self {
        let now = clock.utc();
        let timestamp = iso_timestamp(now);
        Self {
            success: false,
            code: code.http_status(),
            message: code.default_message().to_string(),
            data: None,
            error: Some(ErrorInfo {
                error_code: code,
                error_message: error_message.into(),
                field_errors,
                timestamp: timestamp.clone(),
            }),
            timestamp,
            trace_id: next_trace_id(now),
        }
    }

    /// Answer to an inbound body that could not be decoded.
    pub fn invalid_request(detail: &str, clock: &dyn Clock) -> Self {
        debug!("Rejected malformed request body: {}", detail);
        Self::failure(
            ErrorCode::InvalidRequest,
            format!("Malformed request body: {detail}"),
            None,
            clock,
        )
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.error_code)
    }
}

/// Converts an orchestration outcome into the caller-facing envelope.
pub fn to_envelope(
    outcome: Result<ChatMessage, OrchestrationError>,
    clock: &dyn Clock,
) -> ApiResponse<ChatResponse> {
    let err = match outcome {
        Ok(message) => {
            return ApiResponse::success(ChatResponse::from(&message), SUCCESS_MESSAGE, clock)
        }
        Err(err) => err,
    };

    let code = ErrorCode::from(&err);
    match &err {
        OrchestrationError::ValidationFailed(validation) => {
            debug!("Validation failed: {}", validation);
            ApiResponse::failure(
                code,
                VALIDATION_MESSAGE,
                Some(vec![FieldError::from(validation)]),
                clock,
            )
        }
        OrchestrationError::IllegalTransition(_) => {
            error!("Internal error while processing chat request: {}", err);
            ApiResponse::failure(code, code.default_message(), None, clock)
        }
        _ => {
            if let Some(failed) = err.failed_message() {
                warn!(request_id = %failed.request_id(), code = code.as_str(), "Chat request failed: {}", err);
            }
            ApiResponse::failure(code, code.default_message(), None, clock)
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `req_<epoch-millis>_<sequence>`; the sequence makes ids unique within the
/// process even when the clock stands still.
fn next_trace_id(now: DateTime<Utc>) -> String {
    let seq = TRACE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("req_{}_{}", now.timestamp_millis(), seq)
}

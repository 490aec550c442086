use thiserror::Error;

use super::ChatStatus;

/// Rejection of caller input by the domain rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("message is {length} characters long, limit is {max}")]
    MessageTooLong { length: usize, max: usize },

    #[error("max tokens must be positive, got {value}")]
    InvalidTokenCount { value: i64 },

    #[error("max tokens {value} exceeds the limit of {max}")]
    TokenLimitExceeded { value: i64, max: u32 },
}

impl ValidationError {
    /// Name of the inbound field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyMessage | Self::MessageTooLong { .. } => "message",
            Self::InvalidTokenCount { .. } | Self::TokenLimitExceeded { .. } => "maxTokens",
        }
    }
}

/// A lifecycle transition the state machine does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal transition from {from} to {to}")]
pub struct IllegalTransition {
    pub from: ChatStatus,
    pub to: ChatStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_fields() {
        assert_eq!(ValidationError::EmptyMessage.field(), "message");
        assert_eq!(
            ValidationError::MessageTooLong { length: 4001, max: 4000 }.field(),
            "message"
        );
        assert_eq!(ValidationError::InvalidTokenCount { value: 0 }.field(), "maxTokens");
        assert_eq!(
            ValidationError::TokenLimitExceeded { value: 4001, max: 4000 }.field(),
            "maxTokens"
        );
    }

    #[test]
    fn test_illegal_transition_display() {
        let err = IllegalTransition {
            from: ChatStatus::Completed,
            to: ChatStatus::Processing,
        };
        assert_eq!(err.to_string(), "illegal transition from COMPLETED to PROCESSING");
    }
}

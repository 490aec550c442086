use crate::domain::ValidationError;

/// Longest accepted message, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 4000;
/// Largest token budget a caller may request.
pub const MAX_TOKENS_LIMIT: u32 = 4000;

/// Checks a chat request against the domain rules.
///
/// Rules are applied in order and the first failure is returned: blank
/// message, message length, non-positive token count, token ceiling.
pub fn validate(message: &str, max_tokens: i64) -> Result<(), ValidationError> {
    validate_message(message)?;
    validate_max_tokens(max_tokens)
}

fn validate_message(message: &str) -> Result<(), ValidationError> {
    if message.trim().is_empty() {
        return Err(ValidationError::EmptyMessage);
    }

    let length = message.chars().count();
    if length > MAX_MESSAGE_LENGTH {
        return Err(ValidationError::MessageTooLong {
            length,
            max: MAX_MESSAGE_LENGTH,
        });
    }

    Ok(())
}

fn validate_max_tokens(max_tokens: i64) -> Result<(), ValidationError> {
    if max_tokens <= 0 {
        return Err(ValidationError::InvalidTokenCount { value: max_tokens });
    }
    if max_tokens > i64::from(MAX_TOKENS_LIMIT) {
        return Err(ValidationError::TokenLimitExceeded {
            value: max_tokens,
            max: MAX_TOKENS_LIMIT,
        });
    }

    Ok(())
}

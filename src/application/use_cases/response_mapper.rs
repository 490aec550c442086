use mockable::Clock;

use crate::application::ChatReply;
use crate::domain::{ChatMessage, IllegalTransition};

pub const EMPTY_RESPONSE_REASON: &str = "empty response from external service";

/// Finishes `original` with the external reply.
///
/// A reply without usable text finishes the request as FAILED instead, with
/// [`EMPTY_RESPONSE_REASON`] as its response.
pub fn to_completed(
    original: &ChatMessage,
    reply: &ChatReply,
    clock: &dyn Clock,
) -> Result<ChatMessage, IllegalTransition> {
    match reply.response.as_deref() {
        Some(text) if reply.is_success() => original.complete(text, reply.tokens_used(), clock),
        _ => to_failed(original, EMPTY_RESPONSE_REASON, clock),
    }
}

pub fn to_failed(
    original: &ChatMessage,
    reason: &str,
    clock: &dyn Clock,
) -> Result<ChatMessage, IllegalTransition> {
    original.fail(reason, clock)
}

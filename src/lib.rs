pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

#[cfg(test)]
mod test_support;

pub use application::{
    AdapterError, ChatReply, ExternalChatPort, OrchestrationError, SendChatUseCase,
};

pub use cli::Commands;

pub use connector::{
    to_envelope, ApiResponse, ChatResponse, Container, ContainerConfig, ErrorCode,
    ExternalChatAdapter, HttpClientConfig, HttpTransport, ReqwestTransport, RetryPolicy, Router,
};

pub use domain::{
    validate, ChatMessage, ChatStatus, IllegalTransition, RequestId, ValidationError,
    MAX_MESSAGE_LENGTH, MAX_TOKENS_LIMIT,
};

pub mod container;
pub mod controller;
pub mod envelope;
pub mod router;
pub mod server;

pub use container::{Container, ContainerConfig};
pub use envelope::{to_envelope, ApiResponse, ChatResponse, ErrorCode, ErrorInfo, FieldError};
pub use router::Router;
pub use server::{create_router, serve, AppState, ChatRequest, HealthResponse};

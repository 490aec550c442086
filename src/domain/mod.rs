//! # Domain Layer
//!
//! The chat request entity, its lifecycle state machine, and the validation
//! rules applied before an entity may exist.
//! This layer is independent of external frameworks and infrastructure.

mod error;
pub mod models;
pub mod services;

pub use error::*;
pub use models::*;
pub use services::*;

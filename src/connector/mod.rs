//! # Connector Layer
//!
//! External integrations implementing application ports:
//! - Outbound HTTP adapter for the external chat service (retry, timeouts)
//! - API surface: response envelope, HTTP server, CLI routing

pub mod adapter;
pub mod api;

pub use adapter::*;
pub use api::*;

//! # Application Layer
//!
//! The send-chat use case and the port it drives, coordinating the domain
//! entity with the outbound connector.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;

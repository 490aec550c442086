//! Pure domain rules shared by the entity and the use cases.

mod validator;

pub use validator::*;

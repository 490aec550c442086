mod chat_message;
mod chat_status;

pub use chat_message::*;
pub use chat_status::*;

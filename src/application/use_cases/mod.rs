pub mod response_mapper;
mod send_chat;

pub use send_chat::*;

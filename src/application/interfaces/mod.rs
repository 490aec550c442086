mod external_chat_port;

pub use external_chat_port::*;

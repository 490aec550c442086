mod external_chat_adapter;
mod http_transport;
mod retry;

pub use external_chat_adapter::*;
pub use http_transport::*;
pub use retry::*;

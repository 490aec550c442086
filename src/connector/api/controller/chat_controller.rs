use anyhow::Result;

use crate::connector::api::envelope::to_envelope;

use super::super::Container;

pub struct ChatController<'a> {
    container: &'a Container,
}

impl<'a> ChatController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Sends one message through the full pipeline and renders the envelope.
    pub async fn send(&self, message: String, max_tokens: i64) -> Result<String> {
        let use_case = self.container.send_chat_use_case();
        let outcome = use_case.execute(&message, max_tokens).await;

        let clock = self.container.clock();
        let envelope = to_envelope(outcome, clock.as_ref());
        Ok(serde_json::to_string_pretty(&envelope)?)
    }
}

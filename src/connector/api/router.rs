use anyhow::Result;

use crate::Commands;

use super::container::Container;
use super::controller::{ChatController, HealthController};

pub struct Router<'a> {
    chat_controller: ChatController<'a>,
    health_controller: HealthController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            chat_controller: ChatController::new(container),
            health_controller: HealthController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Send {
                message,
                max_tokens,
            } => self.chat_controller.send(message, max_tokens).await,
            Commands::Health => self.health_controller.health().await,
            Commands::Serve { .. } => unreachable!("serve command is handled separately in main"),
        }
    }
}

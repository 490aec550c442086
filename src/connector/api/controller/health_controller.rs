use anyhow::Result;

use super::super::Container;

pub struct HealthController<'a> {
    container: &'a Container,
}

impl<'a> HealthController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn health(&self) -> Result<String> {
        let healthy = self.container.send_chat_use_case().health().await;
        Ok(self.format_health(healthy))
    }

    fn format_health(&self, healthy: bool) -> String {
        format!(
            "External chat service: {}\nBase URL: {}",
            if healthy { "reachable" } else { "unreachable" },
            self.container.base_url()
        )
    }
}

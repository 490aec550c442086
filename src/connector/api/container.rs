use std::sync::Arc;

use anyhow::{Context, Result};
use mockable::{Clock, DefaultClock};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ExternalChatPort, SendChatUseCase};
use crate::connector::adapter::{
    ExternalChatAdapter, HttpClientConfig, ReqwestTransport, RetryPolicy, DEFAULT_BASE_URL,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Base URL of the external chat service, without a trailing path.
    pub base_url: String,
    pub http: HttpClientConfig,
    pub retry: RetryPolicy,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http: HttpClientConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

pub struct Container {
    clock: Arc<dyn Clock + Send + Sync>,
    send_chat_use_case: Arc<SendChatUseCase>,
    config: ContainerConfig,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.http)
            .context("failed to initialize the outbound HTTP client")?;
        debug!(
            "Outbound client: connect {:?}, request {:?}, {} idle per host",
            config.http.connect_timeout(),
            config.http.request_timeout(),
            config.http.pool_max_idle_per_host
        );

        let chat_port: Arc<dyn ExternalChatPort> = Arc::new(ExternalChatAdapter::new(
            Arc::new(transport),
            config.base_url.clone(),
            config.retry.clone(),
        ));
        debug!("External chat service at {}", config.base_url);

        Ok(Self::with_port(config, chat_port, Arc::new(DefaultClock)))
    }

    /// Wires the use case around an already-built port and clock.
    pub fn with_port(
        config: ContainerConfig,
        chat_port: Arc<dyn ExternalChatPort>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let send_chat_use_case = Arc::new(SendChatUseCase::new(chat_port, Arc::clone(&clock)));

        Self {
            clock,
            send_chat_use_case,
            config,
        }
    }

    pub fn send_chat_use_case(&self) -> Arc<SendChatUseCase> {
        Arc::clone(&self.send_chat_use_case)
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        Arc::clone(&self.clock)
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }
}

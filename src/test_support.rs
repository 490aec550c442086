//! Fakes shared by the unit test modules.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::application::{AdapterError, ChatReply, ExternalChatPort};
use crate::domain::RequestId;

/// Clock frozen at one instant.
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn at_secs(secs: i64) -> Self {
        Self(Utc.timestamp_opt(secs, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Port answering from a queue of prepared outcomes.
pub struct ScriptedPort {
    outcomes: Mutex<VecDeque<Result<ChatReply, AdapterError>>>,
    calls: AtomicUsize,
    healthy: bool,
}

impl ScriptedPort {
    pub fn new(outcomes: Vec<Result<ChatReply, AdapterError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
            healthy: true,
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExternalChatPort for ScriptedPort {
    async fn send(
        &self,
        _request_id: &RequestId,
        _message: &str,
        _max_tokens: u32,
    ) -> Result<ChatReply, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AdapterError::unavailable("script exhausted")))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

//! Mock chat backend
//!
//! Returns deterministic replies without a network. Used by tests and
//! handy for running the UI offline.

use super::backend::ChatBackend;
use crate::{ParleyError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How the mock answers
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Reply with `Echo: <message>`
    Echo,
    /// Always reply with this text
    Fixed(String),
    /// Always fail with this reason
    Fail(String),
}

/// Mock backend; clones share call counters
#[derive(Debug, Clone)]
pub struct MockBackend {
    reply: MockReply,
    delay: Duration,
    calls: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub fn echo() -> Self {
        Self::new(MockReply::Echo)
    }

    pub fn fixed(reply: impl Into<String>) -> Self {
        Self::new(MockReply::Fixed(reply.into()))
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self::new(MockReply::Fail(reason.into()))
    }

    fn new(reply: MockReply) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Delay every reply, to keep a request in flight
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of `ask` calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages received, in call order
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::echo()
    }
}

#[async_trait::async_trait]
impl ChatBackend for MockBackend {
    async fn ask(&self, message: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().push(message.to_string());
        tracing::debug!("Mock backend answering {:?}", message);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.reply {
            MockReply::Echo => Ok(format!("Echo: {}", message)),
            MockReply::Fixed(reply) => Ok(reply.clone()),
            MockReply::Fail(reason) => Err(ParleyError::NetworkError(reason.clone())),
        }
    }
}

//! Message dispatcher
//!
//! Sends one message at a time to a [`ChatBackend`]. The request runs on the
//! tokio runtime; its result comes back over a channel that the UI thread
//! drains with [`MessageDispatcher::poll`]. While a request is in flight the
//! dispatcher is busy and refuses new sends.

use super::backend::ChatBackend;
use crate::Result;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info};

/// Dispatcher state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    #[default]
    Idle,
    Sending,
}

/// Why a send was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The message was empty after trimming
    Empty,
    /// A previous send has not completed
    Busy,
}

/// Completed send
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// The trimmed text that was sent
    pub user_text: String,
    /// Conversation that was active when the send started
    pub conversation_id: String,
    /// Reply text or failure
    pub result: Result<String>,
}

pub struct MessageDispatcher {
    backend: Arc<dyn ChatBackend>,
    runtime: Handle,
    state: DispatchState,
    outcome_tx: Sender<DispatchOutcome>,
    outcome_rx: Receiver<DispatchOutcome>,
    requests_sent: u64,
}

impl MessageDispatcher {
    pub fn new(backend: Arc<dyn ChatBackend>, runtime: Handle) -> Self {
        let (outcome_tx, outcome_rx) = unbounded();
        Self {
            backend,
            runtime,
            state: DispatchState::Idle,
            outcome_tx,
            outcome_rx,
            requests_sent: 0,
        }
    }

    /// Start sending `text` on behalf of `conversation_id`
    pub fn begin(
        &mut self,
        text: &str,
        conversation_id: impl Into<String>,
    ) -> std::result::Result<(), Rejection> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(Rejection::Empty);
        }
        if self.is_busy() {
            debug!("Send ignored, request already in flight");
            return Err(Rejection::Busy);
        }

        self.state = DispatchState::Sending;
        self.requests_sent += 1;

        let backend = Arc::clone(&self.backend);
        let tx = self.outcome_tx.clone();
        let conversation_id = conversation_id.into();

        info!(request = self.requests_sent, "Dispatching message");

        self.runtime.spawn(async move {
            let result = backend.ask(&text).await;
            let _ = tx.send(DispatchOutcome {
                user_text: text,
                conversation_id,
                result,
            });
        });

        Ok(())
    }

    /// Take the completed send, if any, returning to idle
    pub fn poll(&mut self) -> Option<DispatchOutcome> {
        let outcome = self.outcome_rx.try_recv().ok()?;
        self.finish(&outcome);
        Some(outcome)
    }

    /// Block up to `timeout` for the in-flight send to complete
    pub fn wait(&mut self, timeout: Duration) -> Option<DispatchOutcome> {
        match self.outcome_rx.recv_timeout(timeout) {
            Ok(outcome) => {
                self.finish(&outcome);
                Some(outcome)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    fn finish(&mut self, outcome: &DispatchOutcome) {
        self.state = DispatchState::Idle;
        match &outcome.result {
            Ok(reply) => debug!(chars = reply.len(), "Send completed"),
            Err(e) => debug!("Send failed: {}", e),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state == DispatchState::Sending
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Total requests issued since creation
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::MockBackend;
    use crate::ParleyError;

    fn dispatcher(backend: MockBackend) -> (MessageDispatcher, tokio::runtime::Runtime) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let dispatcher = MessageDispatcher::new(Arc::new(backend), runtime.handle().clone());
        (dispatcher, runtime)
    }

    #[test]
    fn test_empty_rejected() {
        let backend = MockBackend::echo();
        let (mut dispatcher, _rt) = dispatcher(backend.clone());

        assert_eq!(dispatcher.begin("   ", "c1"), Err(Rejection::Empty));
        assert_eq!(dispatcher.state(), DispatchState::Idle);
        assert_eq!(dispatcher.requests_sent(), 0);
    }

    #[test]
    fn test_single_request_and_busy_rejection() {
        let backend = MockBackend::fixed("pong").with_delay(Duration::from_millis(200));
        let (mut dispatcher, _rt) = dispatcher(backend.clone());

        assert_eq!(dispatcher.begin("ping", "c1"), Ok(()));
        assert!(dispatcher.is_busy());
        assert_eq!(dispatcher.begin("ping again", "c1"), Err(Rejection::Busy));
        assert_eq!(dispatcher.begin("and again", "c1"), Err(Rejection::Busy));

        let outcome = dispatcher.wait(Duration::from_secs(5)).expect("send completes");
        assert_eq!(outcome.user_text, "ping");
        assert_eq!(outcome.conversation_id, "c1");
        assert_eq!(outcome.result.unwrap(), "pong");
        assert!(!dispatcher.is_busy());

        assert_eq!(backend.calls(), 1);
        assert_eq!(dispatcher.requests_sent(), 1);
    }

    #[test]
    fn test_text_is_trimmed() {
        let backend = MockBackend::echo();
        let (mut dispatcher, _rt) = dispatcher(backend.clone());

        dispatcher.begin("  Hello \n", "c1").unwrap();
        let outcome = dispatcher.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(outcome.user_text, "Hello");
        assert_eq!(backend.received(), vec!["Hello"]);
    }

    #[test]
    fn test_failure_returns_to_idle() {
        let (mut dispatcher, _rt) = dispatcher(MockBackend::failing("offline"));

        dispatcher.begin("Hello", "c1").unwrap();
        let outcome = dispatcher.wait(Duration::from_secs(5)).unwrap();
        assert!(matches!(outcome.result, Err(ParleyError::NetworkError(_))));
        assert_eq!(dispatcher.state(), DispatchState::Idle);

        // A new send is accepted after a failure
        assert!(dispatcher.begin("Again", "c1").is_ok());
    }

    #[test]
    fn test_poll_without_request() {
        let (mut dispatcher, _rt) = dispatcher(MockBackend::echo());
        assert!(dispatcher.poll().is_none());
    }
}

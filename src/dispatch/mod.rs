//! Sending user messages to the chat endpoint

pub mod backend;
pub mod dispatcher;
pub mod mock;

pub use backend::{AskRequest, AskResponse, ChatBackend, HttpBackend};
pub use dispatcher::{DispatchOutcome, DispatchState, MessageDispatcher, Rejection};
pub use mock::{MockBackend, MockReply};

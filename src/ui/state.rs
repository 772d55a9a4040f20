//! Session state
//!
//! [`AppState`] owns the conversation store, the dispatcher and the voice
//! adapter. Widgets call its operations; [`AppState::poll_events`] runs once
//! per frame and folds finished requests and recognitions back in.

use crate::config::AppConfig;
use crate::conversations::{ConversationStore, FileStore, Role};
use crate::dispatch::{ChatBackend, DispatchOutcome, HttpBackend, MessageDispatcher};
use crate::ui::view::ConversationView;
use crate::voice::{self, RecognitionOutcome, RecognitionSession, SpeechCompletion, VoiceAdapter};
use crate::{ParleyError, Result};
use std::sync::Arc;
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, info, warn};

pub const EMPTY_MESSAGE_ALERT: &str = "Please enter a message";
pub const THINKING_TEXT: &str = "Thinking…";

/// Status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Ready,
    Listening,
    Thinking,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Ready => "Ready",
            Status::Listening => "Listening…",
            Status::Thinking => "Thinking…",
        }
    }
}

/// Text shown in the response area for a failed send
pub fn error_text(error: &ParleyError) -> String {
    let reason = match error {
        ParleyError::RemoteError(reason) => reason.clone(),
        other => other.to_string(),
    };
    format!("⚠️ Error: {}", reason)
}

pub struct AppState {
    /// Contents of the message input
    pub input_text: String,

    /// Latest reply, error or "Thinking…"
    pub response_text: String,

    pub status: Status,

    /// History search box
    pub filter: String,

    /// Blocking message waiting for the user to dismiss it
    pub alert: Option<String>,

    pub view: ConversationView,

    store: ConversationStore,
    dispatcher: MessageDispatcher,
    voice: VoiceAdapter,
    recognition: Option<RecognitionSession>,
    speech: Option<SpeechCompletion>,
    focus_input: bool,

    /// Kept alive when the state owns its runtime
    _runtime: Option<Runtime>,
}

impl AppState {
    /// Start a session over an already opened store
    pub fn new(
        store: ConversationStore,
        backend: Arc<dyn ChatBackend>,
        voice: VoiceAdapter,
        runtime: Handle,
    ) -> Self {
        let mut state = Self {
            input_text: String::new(),
            response_text: String::new(),
            status: Status::Ready,
            filter: String::new(),
            alert: None,
            view: ConversationView::new(),
            store,
            dispatcher: MessageDispatcher::new(backend, runtime),
            voice,
            recognition: None,
            speech: None,
            focus_input: true,
            _runtime: None,
        };

        state.view.render_history(&state.store, &state.filter);
        state.store.ensure_active();
        state.refresh();
        state
    }

    /// Build the full native session: file storage, HTTP backend and the
    /// configured speech engines
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("parley-net")
            .enable_all()
            .build()?;

        let store = ConversationStore::open(Box::new(FileStore::new(&config.data_dir)));
        let backend = HttpBackend::new(config.endpoint.clone(), config.request_timeout())?;
        let voice = voice::from_config(&config.voice);

        info!(
            "Session ready: endpoint {}, speech output {}, speech input {}",
            config.endpoint,
            voice.can_speak(),
            voice.can_listen()
        );

        let mut state = Self::new(store, Arc::new(backend), voice, runtime.handle().clone());
        state._runtime = Some(runtime);
        Ok(state)
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn is_busy(&self) -> bool {
        self.dispatcher.is_busy()
    }

    pub fn is_listening(&self) -> bool {
        self.recognition.is_some()
    }

    pub fn can_listen(&self) -> bool {
        self.voice.can_listen()
    }

    /// Whether a spoken reply is still playing
    pub fn is_speaking(&self) -> bool {
        self.speech.is_some()
    }

    /// Start an empty conversation and show it
    pub fn new_conversation(&mut self) {
        self.store.create();
        self.refresh();
        self.focus_input = true;
    }

    /// Whether the message input should grab focus this frame. Set on
    /// startup and after a new conversation; cleared by reading it.
    pub fn take_input_focus(&mut self) -> bool {
        std::mem::take(&mut self.focus_input)
    }

    pub fn select_conversation(&mut self, id: &str) {
        self.view.select(&mut self.store, id, &self.filter);
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
        self.view.render_history(&self.store, &self.filter);
    }

    /// Send the input text to the backend
    pub fn send_message(&mut self) {
        if self.input_text.trim().is_empty() {
            self.alert = Some(EMPTY_MESSAGE_ALERT.to_string());
            return;
        }

        if self.dispatcher.is_busy() {
            debug!("Send ignored while a request is in flight");
            return;
        }

        self.stop_speaking();

        let conversation_id = self.store.ensure_active();
        if let Err(rejection) = self.dispatcher.begin(&self.input_text, conversation_id) {
            debug!("Send rejected: {:?}", rejection);
            return;
        }

        self.status = Status::Thinking;
        self.response_text = THINKING_TEXT.to_string();
    }

    /// Start a voice input session, or cancel the running one
    pub fn start_listening(&mut self) {
        if let Some(session) = &self.recognition {
            debug!("Cancelling voice input");
            session.cancel();
            return;
        }

        if self.dispatcher.is_busy() {
            return;
        }

        match self.voice.listen() {
            Ok(session) => {
                self.recognition = Some(session);
                self.status = Status::Listening;
            }
            Err(e) => {
                warn!("Voice input unavailable: {}", e);
                self.alert = Some(e.user_message());
            }
        }
    }

    pub fn stop_speaking(&mut self) {
        self.voice.stop();
        self.speech = None;
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Fold in anything that finished since the last frame.
    ///
    /// Returns true when something changed.
    pub fn poll_events(&mut self) -> bool {
        let mut changed = false;

        if let Some(outcome) = self.dispatcher.poll() {
            self.finish_send(outcome);
            changed = true;
        }

        if let Some(outcome) = self.recognition.as_ref().and_then(|s| s.poll()) {
            self.recognition = None;
            self.finish_listening(outcome);
            changed = true;
        }

        if let Some(outcome) = self.speech.as_ref().and_then(|s| s.poll()) {
            debug!("Speech ended: {:?}", outcome);
            self.speech = None;
            changed = true;
        }

        changed
    }

    /// Cancel pending voice work and write the store out
    pub fn shutdown(&mut self) {
        if let Some(session) = self.recognition.take() {
            session.cancel();
        }
        self.stop_speaking();
        self.store.persist();
        info!("Session closed");
    }

    fn finish_send(&mut self, outcome: DispatchOutcome) {
        let DispatchOutcome {
            user_text,
            conversation_id,
            result,
        } = outcome;

        match result {
            Ok(reply) => {
                self.response_text = reply.clone();
                self.input_text.clear();
                self.speech = self.voice.speak(&reply);

                if !self.store.append(&conversation_id, Role::User, user_text)
                    || !self.store.append(&conversation_id, Role::Assistant, reply)
                {
                    warn!("Conversation {} is gone, reply not saved", conversation_id);
                }
                self.refresh();
            }
            Err(e) => {
                warn!("Send failed: {}", e);
                self.response_text = error_text(&e);
            }
        }

        self.status = Status::Ready;
    }

    fn finish_listening(&mut self, outcome: RecognitionOutcome) {
        match outcome {
            RecognitionOutcome::Transcript(text) => {
                debug!("Heard: {}", text);
                self.status = Status::Ready;
                self.input_text = text;
                self.send_message();
            }
            RecognitionOutcome::Failed(reason) => {
                self.alert = Some(format!("Voice input error: {}", reason));
                self.status = Status::Ready;
            }
            RecognitionOutcome::Cancelled => {
                if self.status == Status::Listening {
                    self.status = Status::Ready;
                }
            }
        }
    }

    fn refresh(&mut self) {
        self.view.render_messages(&self.store);
        self.view.render_history(&self.store, &self.filter);
    }
}

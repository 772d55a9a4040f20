//! UI automation tests using egui_kittest and AccessKit
//!
//! These drive the real window layout through the accessibility tree and
//! check the session state behind it.

use egui_kittest::kittest::Queryable;
use egui_kittest::Harness;
use parley::conversations::{ConversationStore, MemoryStore};
use parley::dispatch::MockBackend;
use parley::ui::{AppState, ParleyApp, Status};
use parley::voice::VoiceAdapter;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

struct TestApp {
    app: ParleyApp,
    backend: MockBackend,
    _runtime: Runtime,
}

impl TestApp {
    fn new() -> Self {
        Self::with_backend(MockBackend::echo())
    }

    fn with_backend(backend: MockBackend) -> Self {
        let runtime = Runtime::new().unwrap();
        let store = ConversationStore::open(Box::new(MemoryStore::new()));
        let state = AppState::new(
            store,
            Arc::new(backend.clone()),
            VoiceAdapter::unavailable(),
            runtime.handle().clone(),
        );

        Self {
            app: ParleyApp::from_state(state),
            backend,
            _runtime: runtime,
        }
    }

    fn state(&self) -> &AppState {
        self.app.state()
    }
}

fn harness(app: TestApp) -> Harness<'static, TestApp> {
    Harness::builder()
        .with_size(egui::Vec2::new(900.0, 600.0))
        .build_state(|ctx, app: &mut TestApp| app.app.show(ctx), app)
}

fn type_message(harness: &mut Harness<'_, TestApp>, text: &str) {
    harness.get_by_label("Message input").focus();
    harness.run();
    harness.get_by_label("Message input").type_text(text);
    harness.run();
}

/// Keep drawing frames until the in-flight request has landed
fn settle(harness: &mut Harness<'_, TestApp>) {
    for _ in 0..200 {
        harness.run();
        if !harness.state().state().is_busy() {
            harness.run();
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("request never completed");
}

#[test]
fn test_controls_exist() {
    let mut harness = harness(TestApp::new());
    harness.run();

    let _ = harness.get_by_label("Message input");
    let _ = harness.get_by_label("Send message");
    let _ = harness.get_by_label("Voice input");
    let _ = harness.get_by_label("New chat");
    let _ = harness.get_by_label("Search conversations");
    let _ = harness.get_by_label("Status: Ready");
}

#[test]
fn test_type_text_into_input() {
    let mut harness = harness(TestApp::new());
    harness.run();

    type_message(&mut harness, "Hello, world!");
    assert_eq!(harness.state().state().input_text, "Hello, world!");
}

#[test]
fn test_send_shows_reply_and_history() {
    let mut harness = harness(TestApp::with_backend(MockBackend::fixed(
        "Hello! How can I help you today?",
    )));
    harness.run();

    type_message(&mut harness, "Hello AI!");
    harness.get_by_label("Send message").click();
    harness.run();

    settle(&mut harness);

    let _ = harness.get_by_label("User message: Hello AI!");
    let _ = harness.get_by_label("Assistant response: Hello! How can I help you today?");
    let _ = harness.get_by_label("Response: Hello! How can I help you today?");
    let _ = harness.get_by_label("Conversation: Hello AI!");
    let _ = harness.get_by_label("Status: Ready");

    assert_eq!(harness.state().backend.calls(), 1);
    assert!(harness.state().state().input_text.is_empty());
}

#[test]
fn test_status_thinking_while_sending() {
    let mut harness = harness(TestApp::with_backend(
        MockBackend::echo().with_delay(Duration::from_millis(300)),
    ));
    harness.run();

    type_message(&mut harness, "Slow question");
    harness.get_by_label("Send message").click();
    harness.run();

    assert_eq!(harness.state().state().status, Status::Thinking);
    let _ = harness.get_by_label("Status: Thinking…");
    let _ = harness.get_by_label("Response: Thinking…");

    settle(&mut harness);
    assert_eq!(harness.state().state().status, Status::Ready);
}

#[test]
fn test_empty_send_shows_alert() {
    let mut harness = harness(TestApp::new());
    harness.run();

    harness.get_by_label("Send message").click();
    harness.run();

    let _ = harness.get_by_label("Alert: Please enter a message");
    assert_eq!(harness.state().backend.calls(), 0);

    harness.get_by_label("Dismiss alert").click();
    harness.run();
    assert!(harness.state().state().alert.is_none());
    assert!(harness.query_by_label("Alert: Please enter a message").is_none());
}

#[test]
fn test_voice_unavailable_shows_alert() {
    let mut harness = harness(TestApp::new());
    harness.run();

    harness.get_by_label("Voice input").click();
    harness.run();

    let _ = harness.get_by_label("Alert: Speech recognition not supported on this system");
}

#[test]
fn test_new_chat_and_switch_back() {
    let mut harness = harness(TestApp::new());
    harness.run();

    type_message(&mut harness, "First topic");
    harness.get_by_label("Send message").click();
    settle(&mut harness);

    harness.get_by_label("New chat").click();
    harness.run();

    assert_eq!(harness.state().state().store().len(), 2);
    assert!(harness.query_by_label("User message: First topic").is_none());

    harness.get_by_label("Conversation: First topic").click();
    harness.run();

    let _ = harness.get_by_label("User message: First topic");
}

fn input_focused(harness: &Harness<'_, TestApp>) -> bool {
    harness
        .ctx
        .memory(|m| m.has_focus(egui::Id::new("message_input")))
}

#[test]
fn test_input_focused_on_start_and_after_new_chat() {
    let mut harness = harness(TestApp::new());
    harness.run();
    assert!(input_focused(&harness));

    harness.get_by_label("Search conversations").focus();
    harness.run();
    assert!(!input_focused(&harness));

    harness.get_by_label("New chat").click();
    harness.run();
    harness.run();
    assert!(input_focused(&harness));
}

#[test]
fn test_search_filters_history() {
    let mut harness = harness(TestApp::new());
    harness.run();

    type_message(&mut harness, "Paris weather");
    harness.get_by_label("Send message").click();
    settle(&mut harness);

    harness.get_by_label("New chat").click();
    harness.run();

    harness.get_by_label("Search conversations").focus();
    harness.run();
    harness.get_by_label("Search conversations").type_text("xyz");
    harness.run();

    assert_eq!(harness.state().state().filter, "xyz");
    assert!(harness.query_by_label("Conversation: Paris weather").is_none());
    assert!(harness.query_by_label("Conversation: New chat").is_none());
}
